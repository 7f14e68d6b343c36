#![cfg(unix)]

use crate::harness::{assert_link_into, RecordingVcs, TestWorkspace, VcsCall};
use aidb_core::{NoRepository, Outcome, TrackingService};

#[test]
fn test_stage_failure_is_a_warning() {
    let ws = TestWorkspace::named("proj").unwrap();
    ws.write_file("a.md", b"a").unwrap();

    let vcs = RecordingVcs::failing_stage();
    let service = TrackingService::new(ws.root(), &NoRepository, &vcs);
    let report = service.add(ws.work(), &TestWorkspace::args(&["a.md"])).unwrap();

    assert!(matches!(report.outcomes[0].outcome, Outcome::Tracked { .. }));
    assert!(!report.has_failures());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].label, "a.md");
    assert_link_into(&ws.work_path("a.md"), &ws.stored_path("proj/main/a.md"));
}

#[test]
fn test_stage_receives_storage_path() {
    let ws = TestWorkspace::named("proj").unwrap();
    ws.write_file("a.md", b"a").unwrap();

    let vcs = RecordingVcs::new();
    let service = TrackingService::new(ws.root(), &NoRepository, &vcs);
    service.add(ws.work(), &TestWorkspace::args(&["a.md"])).unwrap();

    assert_eq!(
        vcs.calls(),
        vec![VcsCall::Stage(ws.stored_path("proj/main/a.md"))]
    );
}

#[test]
fn test_remove_only_unstages_tracked_paths() {
    let ws = TestWorkspace::named("proj").unwrap();
    ws.write_file("staged.md", b"s").unwrap();
    ws.write_file("unstaged.md", b"u").unwrap();

    let vcs = RecordingVcs::new();
    let service = TrackingService::new(ws.root(), &NoRepository, &vcs);
    service
        .add(ws.work(), &TestWorkspace::args(&["staged.md"]))
        .unwrap();

    // Tracked without version control seeing it
    let quiet = RecordingVcs::new();
    TrackingService::new(ws.root(), &NoRepository, &quiet)
        .add(ws.work(), &TestWorkspace::args(&["unstaged.md"]))
        .unwrap();

    let mut ledger = ws.ledger().unwrap();
    let report = service
        .remove(
            ws.work(),
            &TestWorkspace::args(&["staged.md", "unstaged.md"]),
            &mut ledger,
        )
        .unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(vcs.unstaged(), vec![ws.stored_path("proj/main/staged.md")]);
}

#[test]
fn test_unstage_failure_is_a_warning() {
    let ws = TestWorkspace::named("proj").unwrap();
    ws.write_file("a.md", b"a").unwrap();

    let vcs = RecordingVcs::failing_unstage();
    let service = TrackingService::new(ws.root(), &NoRepository, &vcs);
    service.add(ws.work(), &TestWorkspace::args(&["a.md"])).unwrap();

    let mut ledger = ws.ledger().unwrap();
    let report = service
        .remove(ws.work(), &TestWorkspace::args(&["a.md"]), &mut ledger)
        .unwrap();

    assert!(matches!(report.outcomes[0].outcome, Outcome::Untracked { .. }));
    assert_eq!(report.warnings.len(), 1);
}
