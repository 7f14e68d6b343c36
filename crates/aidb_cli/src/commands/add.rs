//! Add command: move files into storage.

use super::{Output, Session};
use aidb_core::TrackingService;
use anyhow::{Context, Result};

/// Track every file matched by `paths`.
pub fn run(out: &Output, paths: &[String]) -> Result<()> {
    let session = Session::open()?;
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let vcs = session.config.version_control(&session.root);
    let service = TrackingService::new(&session.root, &session.git, &*vcs);

    let pb = out.progress_bar();
    let pb_clone = pb.clone();
    let report = service.add_with_progress(
        &cwd,
        paths,
        Some(&move |current: usize, total: usize| {
            pb_clone.set_length(total as u64);
            pb_clone.set_position(current as u64);
        }),
    );
    pb.finish_and_clear();

    let report = report.map_err(super::output::with_suggestion)?;
    out.finish_batch("Added", &report)
}
