//! List command.

use super::{Output, Session};
use aidb_core::{ListFilter, NoVersionControl, TrackingService};
use anyhow::Result;
use chrono::Local;
use console::style;

/// List stored files with their seen state.
pub fn run(out: &Output, unseen_only: bool) -> Result<()> {
    let session = Session::open()?;
    let mut ledger = session.ledger()?;
    let service = TrackingService::new(&session.root, &session.git, &NoVersionControl);

    let entries = service
        .list(&mut ledger, ListFilter { unseen_only })
        .map_err(super::output::with_suggestion)?;

    if out.json {
        return out.print_json(&serde_json::to_value(&entries)?);
    }

    if entries.is_empty() {
        if !out.quiet {
            println!("No files in {}", session.root.path().display());
        }
        return Ok(());
    }

    for entry in &entries {
        let marker = if entry.seen {
            style("✓").green()
        } else {
            style("•").yellow()
        };
        let mut line = format!("{} {}", marker, entry.path);
        if entry.modified {
            line.push_str(&format!(" {}", style("(modified)").yellow()));
        } else if let Some(at) = entry.seen_at {
            line.push_str(&format!(
                " {}",
                style(format!(
                    "seen {}",
                    at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                ))
                .dim()
            ));
        }
        println!("{}", line);
    }

    if out.verbose() {
        let unseen = entries.iter().filter(|e| !e.seen).count();
        println!();
        println!(
            "{} files, {} unseen",
            style(entries.len()).cyan(),
            style(unseen).yellow()
        );
    }

    Ok(())
}
