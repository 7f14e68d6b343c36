#![cfg(unix)]

use crate::harness::{assert_link_into, assert_regular_file, FailingFs, TestWorkspace};
use aidb_core::{AidbError, NoRepository, NoVersionControl, TrackingService};

#[test]
fn test_symlink_failure_moves_content_back() {
    let ws = TestWorkspace::named("proj").unwrap();
    ws.write_file("a.md", b"content").unwrap();

    let service = TrackingService::new(ws.root(), &NoRepository, &NoVersionControl)
        .with_filesystem(FailingFs::symlink_fails());
    let report = service.add(ws.work(), &TestWorkspace::args(&["a.md"])).unwrap();

    assert!(matches!(
        report.outcomes[0].error(),
        Some(AidbError::LinkFailed { .. })
    ));
    assert_regular_file(&ws.work_path("a.md"), b"content");
    assert!(!ws.stored_path("proj/main/a.md").exists());
}

#[test]
fn test_failed_rollback_is_reported_with_both_paths() {
    let ws = TestWorkspace::named("proj").unwrap();
    ws.write_file("a.md", b"content").unwrap();

    // Move 1 relocates, move 2 is the rollback
    let service = TrackingService::new(ws.root(), &NoRepository, &NoVersionControl)
        .with_filesystem(FailingFs::symlink_and_move_fail(2));
    let report = service.add(ws.work(), &TestWorkspace::args(&["a.md"])).unwrap();

    match report.outcomes[0].error() {
        Some(AidbError::PartialRollbackFailure {
            operation,
            original,
            storage,
            ..
        }) => {
            assert_eq!(*operation, "track");
            assert_eq!(original, &ws.work_path("a.md"));
            assert_eq!(storage, &ws.stored_path("proj/main/a.md"));
        }
        other => panic!("expected PartialRollbackFailure, got {:?}", other),
    }
    assert!(report.outcomes[0]
        .error()
        .and_then(|e| e.recovery_suggestion())
        .is_some());
    assert_regular_file(&ws.stored_path("proj/main/a.md"), b"content");
}

#[test]
fn test_failed_move_back_restores_symlink() {
    let ws = TestWorkspace::named("proj").unwrap();
    ws.write_file("a.md", b"content").unwrap();

    let service = TrackingService::new(ws.root(), &NoRepository, &NoVersionControl);
    service.add(ws.work(), &TestWorkspace::args(&["a.md"])).unwrap();

    let failing = TrackingService::new(ws.root(), &NoRepository, &NoVersionControl)
        .with_filesystem(FailingFs::move_fails(1));
    let mut ledger = ws.ledger().unwrap();
    let report = failing
        .remove(ws.work(), &TestWorkspace::args(&["a.md"]), &mut ledger)
        .unwrap();

    assert!(matches!(
        report.outcomes[0].error(),
        Some(AidbError::MoveFailed { .. })
    ));
    assert_link_into(&ws.work_path("a.md"), &ws.stored_path("proj/main/a.md"));
    assert_regular_file(&ws.stored_path("proj/main/a.md"), b"content");
}

#[test]
fn test_failed_untrack_rollback_leaves_content_in_storage() {
    let ws = TestWorkspace::named("proj").unwrap();
    ws.write_file("a.md", b"content").unwrap();

    let service = TrackingService::new(ws.root(), &NoRepository, &NoVersionControl);
    service.add(ws.work(), &TestWorkspace::args(&["a.md"])).unwrap();

    // The move back fails and so does restoring the symlink
    let failing = TrackingService::new(ws.root(), &NoRepository, &NoVersionControl)
        .with_filesystem(FailingFs::symlink_and_move_fail(1));
    let mut ledger = ws.ledger().unwrap();
    let report = failing
        .remove(ws.work(), &TestWorkspace::args(&["a.md"]), &mut ledger)
        .unwrap();

    let err = report.outcomes[0].error();
    match err {
        Some(AidbError::PartialRollbackFailure {
            operation, storage, ..
        }) => {
            assert_eq!(*operation, "untrack");
            assert_eq!(storage, &ws.stored_path("proj/main/a.md"));
        }
        other => panic!("expected PartialRollbackFailure, got {:?}", other),
    }
    assert!(err.is_some_and(|e| e.is_fatal()));
    assert!(std::fs::symlink_metadata(ws.work_path("a.md")).is_err());
    assert_regular_file(&ws.stored_path("proj/main/a.md"), b"content");
}

#[test]
fn test_dangling_link_reports_missing_storage() {
    let ws = TestWorkspace::named("proj").unwrap();
    ws.write_file("a.md", b"content").unwrap();

    let service = TrackingService::new(ws.root(), &NoRepository, &NoVersionControl);
    service.add(ws.work(), &TestWorkspace::args(&["a.md"])).unwrap();
    std::fs::remove_file(ws.stored_path("proj/main/a.md")).unwrap();

    let mut ledger = ws.ledger().unwrap();
    let report = service
        .remove(ws.work(), &TestWorkspace::args(&["a.md"]), &mut ledger)
        .unwrap();
    assert!(matches!(
        report.outcomes[0].error(),
        Some(AidbError::MissingStorageFile { .. })
    ));
}
