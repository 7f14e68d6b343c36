//! Status command.

use super::{Output, Session};
use aidb_core::{learn_status, LearnStatus};
use anyhow::Result;
use chrono::Local;
use console::style;

/// Show which LEARN.md summaries are behind their directory's content.
pub fn run(out: &Output) -> Result<()> {
    let session = Session::open()?;
    let statuses = learn_status(&session.root).map_err(super::output::with_suggestion)?;

    if out.json {
        return out.print_json(&serde_json::to_value(&statuses)?);
    }

    if statuses.is_empty() {
        if !out.quiet {
            println!("No LEARN.md files found");
        }
        return Ok(());
    }

    let stale = statuses.iter().filter(|s| !s.up_to_date).count();
    if out.quiet {
        for status in statuses.iter().filter(|s| !s.up_to_date) {
            println!("{}", display_dir(status));
        }
        return Ok(());
    }

    for status in &statuses {
        let date = status
            .modified
            .map(|at| at.with_timezone(&Local).format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        if status.up_to_date {
            println!(
                "{} {} {}",
                style("✓").green(),
                display_dir(status),
                style(format!("(up to date, {})", date)).dim()
            );
        } else {
            println!(
                "{} {} {}",
                style("!").yellow(),
                display_dir(status),
                style(format!("(needs update, {})", date)).dim()
            );
            println!("  {} add {}", style("→").cyan(), status.marker());
        }
    }

    println!();
    if stale > 0 {
        println!("{} file(s) need updating", style(stale).yellow());
    } else {
        println!("{} All LEARN.md files up to date", style("✓").green());
    }

    Ok(())
}

fn display_dir(status: &LearnStatus) -> &str {
    if status.dir.is_empty() {
        "."
    } else {
        &status.dir
    }
}
