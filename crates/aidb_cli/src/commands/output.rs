//! Console and JSON rendering shared by the commands.

use aidb_core::{AidbError, BatchReport, FileOutcome, Outcome};
use anyhow::{bail, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};

/// Output mode selected by the global flags.
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    /// Returns true if human-readable chatter should be printed.
    pub fn verbose(&self) -> bool {
        !self.json && !self.quiet
    }

    /// Creates a progress bar for a batch, hidden in quiet or JSON mode.
    pub fn progress_bar(&self) -> ProgressBar {
        if !self.verbose() {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(0);
        if let Ok(bar_style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(bar_style.progress_chars("█▓▒░  "));
        }
        pb
    }

    /// Prints a JSON value to stdout.
    pub fn print_json(&self, value: &Value) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Prints every outcome and warning of a batch, then fails if any file
    /// failed.
    pub fn finish_batch(&self, verb: &str, report: &BatchReport) -> Result<()> {
        if self.json {
            self.print_json(&report_json(report))?;
        } else {
            for file in &report.outcomes {
                self.print_outcome(file);
            }
            for warning in &report.warnings {
                eprintln!(
                    "{} {}: {}",
                    style("⚠").yellow(),
                    warning.label,
                    warning.message
                );
            }
            if self.verbose() {
                println!();
                println!(
                    "{} {}, {} skipped, {} failed",
                    style(verb).bold(),
                    style(report.succeeded()).green(),
                    style(report.skipped()).cyan(),
                    if report.has_failures() {
                        style(report.failed()).red()
                    } else {
                        style(report.failed()).green()
                    }
                );
            }
        }

        if report.has_failures() {
            bail!(
                "{} of {} files failed",
                report.failed(),
                report.outcomes.len()
            );
        }
        Ok(())
    }

    fn print_outcome(&self, file: &FileOutcome) {
        match &file.outcome {
            Outcome::Failed(e) => {
                eprintln!("{} {}: {}", style("×").red(), file.label, e);
                if let Some(hint) = e.recovery_suggestion() {
                    eprintln!("  {} {}", style("→").cyan(), hint);
                }
            }
            _ if self.quiet => {}
            Outcome::Tracked { storage } => println!(
                "{} {} → {}",
                style("✓").green(),
                file.label,
                style(storage.display()).dim()
            ),
            Outcome::AlreadyTracked => println!(
                "{} {} {}",
                style("-").cyan(),
                file.label,
                style("(already tracked)").dim()
            ),
            Outcome::Untracked { storage } => println!(
                "{} {} ← {}",
                style("✓").green(),
                file.label,
                style(storage.display()).dim()
            ),
            Outcome::MarkedSeen { .. } => {
                println!("{} {} {}", style("✓").green(), file.label, style("seen").dim())
            }
            Outcome::MarkedUnseen => println!(
                "{} {} {}",
                style("✓").green(),
                file.label,
                style("unseen").dim()
            ),
        }
    }
}

/// Wraps a core error so the recovery hint is printed with it.
pub fn with_suggestion(err: AidbError) -> anyhow::Error {
    match err.recovery_suggestion() {
        Some(hint) => anyhow::anyhow!("{}\n  hint: {}", err, hint),
        None => anyhow::Error::new(err),
    }
}

fn report_json(report: &BatchReport) -> Value {
    let files: Vec<Value> = report.outcomes.iter().map(outcome_json).collect();
    let warnings: Vec<Value> = report
        .warnings
        .iter()
        .map(|w| json!({ "path": w.label, "message": w.message }))
        .collect();

    json!({
        "succeeded": report.succeeded(),
        "skipped": report.skipped(),
        "failed": report.failed(),
        "files": files,
        "warnings": warnings,
    })
}

fn outcome_json(file: &FileOutcome) -> Value {
    let path = file.path.display().to_string();
    match &file.outcome {
        Outcome::Tracked { storage } => json!({
            "path": path,
            "status": "tracked",
            "storage": storage.display().to_string(),
        }),
        Outcome::AlreadyTracked => json!({ "path": path, "status": "already_tracked" }),
        Outcome::Untracked { storage } => json!({
            "path": path,
            "status": "untracked",
            "storage": storage.display().to_string(),
        }),
        Outcome::MarkedSeen { hash } => json!({
            "path": path,
            "status": "seen",
            "hash": hash,
        }),
        Outcome::MarkedUnseen => json!({ "path": path, "status": "unseen" }),
        Outcome::Failed(e) => json!({
            "path": path,
            "status": "failed",
            "error": e.to_string(),
            "hint": e.recovery_suggestion(),
        }),
    }
}
