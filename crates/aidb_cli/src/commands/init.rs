//! Initialize the storage root.

use super::{Output, Session};
use anyhow::{Context, Result};
use console::style;
use serde_json::json;

/// Create the storage root and, if git is enabled, a repository inside it.
pub fn run(out: &Output, remote: Option<&str>) -> Result<()> {
    let session = Session::open()?;
    let root = session.root.path();
    session
        .root
        .ensure()
        .with_context(|| format!("Failed to create {}", root.display()))?;

    let git_enabled = session.config.git.enabled;
    if git_enabled {
        let git = &session.git;
        if !git.is_available() {
            anyhow::bail!(
                "git binary {:?} not found (set git.enabled = false to run without git)",
                session.config.git.binary
            );
        }
        git.init_repository(remote)
            .context("Failed to initialize storage repository")?;
    } else if remote.is_some() {
        anyhow::bail!("--remote requires git.enabled = true");
    }

    if out.json {
        return out.print_json(&json!({
            "root": root.display().to_string(),
            "git": git_enabled,
            "remote": remote,
        }));
    }

    if out.verbose() {
        println!(
            "{} Initialized aidb storage in {}",
            style("✓").green(),
            style(root.display()).cyan()
        );
        if git_enabled {
            println!("  Git repository with default branch main");
        }
        if let Some(url) = remote {
            println!("  Remote origin: {}", url);
        }
    }

    Ok(())
}
