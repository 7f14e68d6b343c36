#![cfg(unix)]

use crate::harness::{assert_link_into, assert_regular_file, TestWorkspace};
use aidb_core::{AidbError, NoRepository, NoVersionControl, Outcome, TrackingService};

#[test]
fn test_already_tracked_file_does_not_stop_batch() {
    let ws = TestWorkspace::named("proj").unwrap();
    ws.write_file("a.md", b"a").unwrap();
    ws.write_file("b.md", b"b").unwrap();
    ws.write_file("c.md", b"c").unwrap();

    let service = TrackingService::new(ws.root(), &NoRepository, &NoVersionControl);
    service.add(ws.work(), &TestWorkspace::args(&["b.md"])).unwrap();

    let report = service
        .add(ws.work(), &TestWorkspace::args(&["a.md", "b.md", "c.md"]))
        .unwrap();

    let labels: Vec<_> = report.outcomes.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, ["a.md", "b.md", "c.md"]);
    assert!(matches!(report.outcomes[0].outcome, Outcome::Tracked { .. }));
    assert!(matches!(report.outcomes[1].outcome, Outcome::AlreadyTracked));
    assert!(matches!(report.outcomes[2].outcome, Outcome::Tracked { .. }));
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.skipped(), 1);
    assert!(!report.has_failures());
}

#[test]
fn test_occupied_destination_fails_only_that_file() {
    let ws = TestWorkspace::named("proj").unwrap();
    ws.write_file("a.md", b"mine").unwrap();
    ws.write_file("b.md", b"b").unwrap();
    ws.write_stored("proj/main/a.md", b"theirs").unwrap();

    let service = TrackingService::new(ws.root(), &NoRepository, &NoVersionControl);
    let report = service
        .add(ws.work(), &TestWorkspace::args(&["a.md", "b.md"]))
        .unwrap();

    assert!(matches!(
        report.outcomes[0].error(),
        Some(AidbError::AlreadyTracked { .. })
    ));
    assert!(matches!(report.outcomes[1].outcome, Outcome::Tracked { .. }));
    assert_eq!(report.failed(), 1);

    // Neither side was overwritten
    assert_regular_file(&ws.work_path("a.md"), b"mine");
    assert_regular_file(&ws.stored_path("proj/main/a.md"), b"theirs");
    assert_link_into(&ws.work_path("b.md"), &ws.stored_path("proj/main/b.md"));
}

#[test]
fn test_foreign_symlink_and_bad_pattern_reported_in_order() {
    let ws = TestWorkspace::named("proj").unwrap();
    let elsewhere = ws.path().join("elsewhere.md");
    std::fs::write(&elsewhere, b"x").unwrap();
    std::os::unix::fs::symlink(&elsewhere, ws.work_path("link.md")).unwrap();
    ws.write_file("ok.md", b"ok").unwrap();

    let service = TrackingService::new(ws.root(), &NoRepository, &NoVersionControl);
    let report = service
        .add(ws.work(), &TestWorkspace::args(&["[", "link.md", "ok.md"]))
        .unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert!(matches!(
        report.outcomes[0].error(),
        Some(AidbError::InvalidPattern { .. })
    ));
    assert!(matches!(
        report.outcomes[1].error(),
        Some(AidbError::ForeignSymlink { .. })
    ));
    assert!(matches!(report.outcomes[2].outcome, Outcome::Tracked { .. }));
}

#[test]
fn test_glob_tracks_every_match() {
    let ws = TestWorkspace::named("proj").unwrap();
    ws.write_file("one.md", b"1").unwrap();
    ws.write_file("two.md", b"2").unwrap();
    ws.write_file("skip.txt", b"3").unwrap();

    let service = TrackingService::new(ws.root(), &NoRepository, &NoVersionControl);
    let report = service.add(ws.work(), &TestWorkspace::args(&["*.md"])).unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_regular_file(&ws.work_path("skip.txt"), b"3");
}
