//! LEARN.md freshness: a directory summary is current when it carries the
//! digest of its sibling files.

use crate::digest::hash_content;
use crate::error::Result;
use crate::storage::StorageRoot;
use crate::walk::stored_files;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use tracing::debug;

/// File name of a per-directory summary.
pub const LEARN_FILE_NAME: &str = "LEARN.md";

/// Hex digits of the tree digest written into the marker.
pub const MARKER_HEX_LEN: usize = 8;

/// Freshness of one LEARN.md file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnStatus {
    /// Storage-relative directory holding the LEARN.md (empty for the root).
    pub dir: String,
    /// Short digest of the directory's other files.
    pub hash: String,
    /// LEARN.md contains the marker for `hash`.
    pub up_to_date: bool,
    /// Last modification of the LEARN.md itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

impl LearnStatus {
    /// The marker line a current LEARN.md contains.
    pub fn marker(&self) -> String {
        marker_for(&self.hash)
    }
}

/// Formats the marker line for a short digest.
pub fn marker_for(hash: &str) -> String {
    format!("<!-- hash:{} -->", hash)
}

/// Digests every stored file under `dir` except those named `exclude`.
///
/// Each file contributes its `/`-separated path relative to `dir` and its
/// content hash, in sorted order, so renames and edits both change the
/// result while timestamps do not. Returns the first
/// [`MARKER_HEX_LEN`] hex digits.
///
/// # Errors
///
/// Returns `NotFound` if a file disappears or becomes unreadable mid-walk.
pub fn tree_digest(dir: &Path, exclude: &str) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    for path in stored_files(dir) {
        if path.file_name().is_some_and(|name| name == exclude) {
            continue;
        }
        let Ok(rel) = path.strip_prefix(dir) else {
            continue;
        };
        let rel: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        hasher.update(rel.join("/").as_bytes());
        hasher.update(&[0]);
        hasher.update(hash_content(&path)?.as_str().as_bytes());
        hasher.update(b"\n");
    }

    let hex = hasher.finalize().to_hex();
    Ok(hex.as_str()[..MARKER_HEX_LEN].to_string())
}

/// Reports every LEARN.md under the storage root, in path order.
///
/// A missing root has no summaries. Unreadable summaries are skipped.
pub fn learn_status(root: &StorageRoot) -> Result<Vec<LearnStatus>> {
    if !root.path().is_dir() {
        return Ok(Vec::new());
    }

    let mut statuses = Vec::new();
    for learn in stored_files(root.path()) {
        if learn.file_name() != Some(OsStr::new(LEARN_FILE_NAME)) {
            continue;
        }
        let Some(dir) = learn.parent() else {
            continue;
        };

        let content = match fs::read_to_string(&learn) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %learn.display(), error = %e, "skipping unreadable summary");
                continue;
            }
        };
        let hash = match tree_digest(dir, LEARN_FILE_NAME) {
            Ok(hash) => hash,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                continue;
            }
        };

        let modified = fs::metadata(&learn)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        statuses.push(LearnStatus {
            dir: root.relative_key(dir).unwrap_or_default(),
            up_to_date: content.contains(&marker_for(&hash)),
            hash,
            modified,
        });
    }

    debug!(summaries = statuses.len(), "checked summaries");
    Ok(statuses)
}
