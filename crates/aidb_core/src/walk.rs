//! Input expansion: glob patterns and directory traversal.

use crate::error::{AidbError, Result};
use crate::storage::LEDGER_FILE_NAME;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Expands one input pattern relative to `base`.
///
/// A pattern matching nothing is returned as a literal path, so a plain
/// filename without glob metacharacters still works (and a missing file
/// surfaces later as a per-file error).
///
/// # Errors
///
/// Returns `InvalidPattern` if the pattern cannot be parsed.
pub fn expand_pattern(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let joined = base.join(pattern);
    // Metacharacters in the base directory itself must match literally.
    let text = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        PathBuf::from(glob::Pattern::escape(&base.to_string_lossy()))
            .join(pattern)
            .to_string_lossy()
            .into_owned()
    };

    let paths = glob::glob(&text).map_err(|e| AidbError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.msg.to_string(),
    })?;

    let mut matches = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => matches.push(path),
            Err(err) => {
                debug!(%err, pattern, "skipping unreadable glob match");
            }
        }
    }

    if matches.is_empty() {
        matches.push(joined);
    }

    Ok(matches)
}

/// Lazily yields every leaf (non-directory) entry beneath `dir`, sorted.
///
/// Symlinks are yielded without being followed. Entries that cannot be read
/// are skipped rather than aborting the walk.
pub fn leaf_files(dir: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(%err, "skipping path during walk");
                None
            }
        })
        .filter(|entry| !entry.file_type().is_dir())
        .map(|entry| entry.into_path())
}

/// Lazily yields every tracked file in the storage root, sorted.
///
/// Skips the `.git` directory and the ledger file itself.
pub fn stored_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !(entry.file_type().is_dir() && entry.file_name() == ".git"))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(%err, "skipping path during walk");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            !(entry.depth() == 1 && entry.file_name() == LEDGER_FILE_NAME)
        })
        .map(|entry| entry.into_path())
}
