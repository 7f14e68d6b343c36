//! Seen/unseen commands.

use super::{Output, Session};
use aidb_core::{NoVersionControl, TrackingService};
use anyhow::Result;

/// Mark stored files as processed at their current content.
pub fn seen(out: &Output, patterns: &[String]) -> Result<()> {
    let session = Session::open()?;
    let mut ledger = session.ledger()?;
    let service = TrackingService::new(&session.root, &session.git, &NoVersionControl);

    let report = service
        .mark_seen(patterns, &mut ledger)
        .map_err(super::output::with_suggestion)?;
    out.finish_batch("Marked seen", &report)
}

/// Clear the processed flag on stored files.
pub fn unseen(out: &Output, patterns: &[String]) -> Result<()> {
    let session = Session::open()?;
    let mut ledger = session.ledger()?;
    let service = TrackingService::new(&session.root, &session.git, &NoVersionControl);

    let report = service
        .mark_unseen(patterns, &mut ledger)
        .map_err(super::output::with_suggestion)?;
    out.finish_batch("Marked unseen", &report)
}
