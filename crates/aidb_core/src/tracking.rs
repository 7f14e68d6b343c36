//! Batch orchestration of add/remove/seen/unseen/list.
//!
//! Every input file gets exactly one [`FileOutcome`], in input order. A
//! failing file never stops the batch; only errors on the shared ledger
//! abort the whole call. Version-control failures are downgraded to
//! [`Warning`]s because the filesystem change has already happened.

use crate::collaborator::{RepositoryDiscovery, VersionControl};
use crate::digest::hash_content;
use crate::error::{AidbError, Result};
use crate::link::{Filesystem, LinkManager};
use crate::metadata::MetadataStore;
use crate::storage::StorageRoot;
use crate::walk::{expand_pattern, leaf_files, stored_files};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Progress callback for batch operations, called with (current, total).
pub type ProgressCallback<'a> = dyn Fn(usize, usize) + 'a;

/// Result for a single input file.
#[derive(Debug)]
pub enum Outcome {
    /// Moved into storage and linked back.
    Tracked {
        /// Where the content now lives
        storage: PathBuf,
    },
    /// Already a symlink into storage; nothing changed.
    AlreadyTracked,
    /// Content moved back out of storage.
    Untracked {
        /// Where the content came from
        storage: PathBuf,
    },
    /// Recorded as processed at this hash.
    MarkedSeen {
        /// The recorded content hash
        hash: String,
    },
    /// Seen flag cleared.
    MarkedUnseen,
    /// The operation failed for this file.
    Failed(AidbError),
}

/// Outcome for one file, labelled for display.
#[derive(Debug)]
pub struct FileOutcome {
    /// Absolute path that was operated on.
    pub path: PathBuf,
    /// Short label: relative to the working directory, or the storage key.
    pub label: String,
    /// What happened.
    pub outcome: Outcome,
}

impl FileOutcome {
    /// Returns true if the file failed.
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }

    /// Returns true if the file was skipped as already tracked.
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::AlreadyTracked)
    }

    /// Returns the error, if the file failed.
    pub fn error(&self) -> Option<&AidbError> {
        match &self.outcome {
            Outcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// A best-effort side call that failed without failing its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// The file the warning belongs to.
    pub label: String,
    /// What went wrong.
    pub message: String,
}

/// Outcomes of a batch, in input order, plus collected warnings.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per input file.
    pub outcomes: Vec<FileOutcome>,
    /// Warnings from best-effort collaborator calls.
    pub warnings: Vec<Warning>,
}

impl BatchReport {
    /// Number of files that succeeded.
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !o.is_failure() && !o.is_skipped())
            .count()
    }

    /// Number of files skipped as already tracked.
    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    /// Number of files that failed.
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    /// Returns true if any file failed.
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// One row of [`TrackingService::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    /// Storage-relative path.
    pub path: String,
    /// Seen at the current content.
    pub seen: bool,
    /// Hash recorded in the ledger, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// When the file was last marked seen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seen_at: Option<DateTime<Utc>>,
    /// Content differs from the recorded hash.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub modified: bool,
}

/// Filter for [`TrackingService::list`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ListFilter {
    /// Only return files that are not seen.
    pub unseen_only: bool,
}

/// Ties path resolution, relocation, the ledger and version control together.
pub struct TrackingService<'a> {
    root: &'a StorageRoot,
    links: LinkManager<'a>,
    vcs: &'a dyn VersionControl,
}

impl<'a> TrackingService<'a> {
    /// Creates a service over `root`.
    pub fn new(
        root: &'a StorageRoot,
        discovery: &'a dyn RepositoryDiscovery,
        vcs: &'a dyn VersionControl,
    ) -> Self {
        Self {
            root,
            links: LinkManager::new(root, discovery),
            vcs,
        }
    }

    /// Replaces the filesystem primitives used for relocation.
    pub fn with_filesystem(mut self, fs: impl Filesystem + 'a) -> Self {
        self.links = self.links.with_filesystem(fs);
        self
    }

    /// Tracks every file matched by `patterns` (relative to `cwd`).
    ///
    /// Directories are expanded to their leaf files, each tracked
    /// independently.
    pub fn add(&self, cwd: &Path, patterns: &[String]) -> Result<BatchReport> {
        self.add_with_progress(cwd, patterns, None)
    }

    /// Like [`TrackingService::add`], reporting progress per file.
    pub fn add_with_progress(
        &self,
        cwd: &Path,
        patterns: &[String],
        progress: Option<&ProgressCallback<'_>>,
    ) -> Result<BatchReport> {
        self.root.ensure()?;

        let mut report = BatchReport::default();
        let inputs = expand_inputs(cwd, patterns);
        let total = inputs.len();

        for (i, input) in inputs.into_iter().enumerate() {
            if let Some(cb) = progress {
                cb(i + 1, total);
            }
            let path = match input {
                Ok(path) => path,
                Err(rejected) => {
                    report.outcomes.push(rejected);
                    continue;
                }
            };

            let label = label_from(cwd, &path);
            let outcome = match self.links.track(&path, cwd) {
                Ok(storage) => {
                    if let Err(e) = self.vcs.stage(&storage) {
                        warn!(path = %storage.display(), error = %e, "stage failed");
                        report.warnings.push(Warning {
                            label: label.clone(),
                            message: format!("stage failed: {}", e),
                        });
                    }
                    Outcome::Tracked { storage }
                }
                Err(AidbError::AlreadyLinked { .. }) => Outcome::AlreadyTracked,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "track failed");
                    Outcome::Failed(e)
                }
            };

            report.outcomes.push(FileOutcome {
                path,
                label,
                outcome,
            });
        }

        Ok(report)
    }

    /// Untracks every tracked symlink matched by `patterns` (relative to `cwd`).
    ///
    /// Ledger entries for the returned files are dropped and the ledger is
    /// saved once at the end.
    ///
    /// # Errors
    ///
    /// Only ledger failures (`PersistFailure`) are returned as errors.
    pub fn remove(
        &self,
        cwd: &Path,
        patterns: &[String],
        metadata: &mut MetadataStore,
    ) -> Result<BatchReport> {
        self.remove_with_progress(cwd, patterns, metadata, None)
    }

    /// Like [`TrackingService::remove`], reporting progress per file.
    pub fn remove_with_progress(
        &self,
        cwd: &Path,
        patterns: &[String],
        metadata: &mut MetadataStore,
        progress: Option<&ProgressCallback<'_>>,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let inputs = expand_inputs(cwd, patterns);
        let total = inputs.len();

        for (i, input) in inputs.into_iter().enumerate() {
            if let Some(cb) = progress {
                cb(i + 1, total);
            }
            let path = match input {
                Ok(path) => path,
                Err(rejected) => {
                    report.outcomes.push(rejected);
                    continue;
                }
            };

            let label = label_from(cwd, &path);
            let outcome = match self.links.untrack(&path) {
                Ok(storage) => {
                    if let Some(key) = self.root.relative_key(&storage) {
                        metadata.remove(&key);
                    }
                    self.unstage(&storage, &label, &mut report);
                    Outcome::Untracked { storage }
                }
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "untrack failed");
                    Outcome::Failed(e)
                }
            };

            report.outcomes.push(FileOutcome {
                path,
                label,
                outcome,
            });
        }

        if metadata.is_dirty() {
            metadata.save()?;
        }

        Ok(report)
    }

    fn unstage(&self, storage: &Path, label: &str, report: &mut BatchReport) {
        let result = match self.vcs.is_tracked(storage) {
            Ok(true) => self.vcs.unstage(storage),
            Ok(false) => return,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            warn!(path = %storage.display(), error = %e, "unstage failed");
            report.warnings.push(Warning {
                label: label.to_string(),
                message: format!("unstage failed: {}", e),
            });
        }
    }

    /// Marks files matched by `patterns` (relative to the storage root) as seen
    /// at their current content hash.
    pub fn mark_seen(
        &self,
        patterns: &[String],
        metadata: &mut MetadataStore,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for input in self.expand_stored(patterns) {
            let path = match input {
                Ok(path) => path,
                Err(rejected) => {
                    report.outcomes.push(rejected);
                    continue;
                }
            };

            let label = self.storage_label(&path);
            let outcome = match self.storage_key(&path) {
                Ok(key) => match hash_content(&path) {
                    Ok(hash) => {
                        metadata.mark_seen(&key, hash.as_str());
                        Outcome::MarkedSeen {
                            hash: hash.to_string(),
                        }
                    }
                    Err(e) => Outcome::Failed(e),
                },
                Err(e) => Outcome::Failed(e),
            };
            report.outcomes.push(FileOutcome {
                path,
                label,
                outcome,
            });
        }

        if metadata.is_dirty() {
            metadata.save()?;
        }

        Ok(report)
    }

    /// Clears the seen flag for files matched by `patterns` (relative to the
    /// storage root). Files without a ledger entry are already unseen.
    pub fn mark_unseen(
        &self,
        patterns: &[String],
        metadata: &mut MetadataStore,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for input in self.expand_stored(patterns) {
            let path = match input {
                Ok(path) => path,
                Err(rejected) => {
                    report.outcomes.push(rejected);
                    continue;
                }
            };

            let label = self.storage_label(&path);
            let outcome = match self.storage_key(&path) {
                Ok(key) => {
                    metadata.mark_unseen(&key);
                    Outcome::MarkedUnseen
                }
                Err(e) => Outcome::Failed(e),
            };
            report.outcomes.push(FileOutcome {
                path,
                label,
                outcome,
            });
        }

        if metadata.is_dirty() {
            metadata.save()?;
        }

        Ok(report)
    }

    /// Lists every stored file with its seen state at the current content.
    ///
    /// Reading applies lazy invalidation; flipped entries are saved.
    pub fn list(&self, metadata: &mut MetadataStore, filter: ListFilter) -> Result<Vec<ListEntry>> {
        if !self.root.path().is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for path in stored_files(self.root.path()) {
            let Some(key) = self.root.relative_key(&path) else {
                continue;
            };
            let current = match hash_content(&path) {
                Ok(hash) => hash,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };

            let record = metadata.get(&key).cloned();
            let seen = metadata.is_seen(&key, current.as_str());
            if filter.unseen_only && seen {
                continue;
            }

            let modified = record
                .as_ref()
                .map(|r| !r.hash.is_empty() && r.hash != current.as_str())
                .unwrap_or(false);

            entries.push(ListEntry {
                path: key,
                seen,
                hash: record.as_ref().map(|r| r.hash.clone()),
                seen_at: record.and_then(|r| r.seen_at),
                modified,
            });
        }

        debug!(
            records = metadata.len(),
            files = entries.len(),
            "listed storage"
        );
        if metadata.is_dirty() {
            metadata.save()?;
        }

        Ok(entries)
    }

    fn expand_stored(&self, patterns: &[String]) -> Vec<Expanded> {
        let mut paths = Vec::new();
        for pattern in patterns {
            match expand_pattern(self.root.path(), pattern) {
                Ok(matches) => {
                    for path in matches {
                        if self.is_bookkeeping(&path) {
                            debug!(path = %path.display(), "skipping bookkeeping path");
                            continue;
                        }
                        if path.is_dir() {
                            paths.extend(stored_files(&path).map(Ok));
                        } else {
                            paths.push(Ok(path));
                        }
                    }
                }
                Err(e) => paths.push(Err(rejected(self.root.path(), pattern, e))),
            }
        }
        paths
    }

    /// True for the ledger file and anything inside a `.git` directory.
    fn is_bookkeeping(&self, path: &Path) -> bool {
        if path == self.root.ledger_path() {
            return true;
        }
        path.strip_prefix(self.root.path())
            .map(|rel| rel.components().any(|c| c.as_os_str() == ".git"))
            .unwrap_or(false)
    }

    fn storage_key(&self, path: &Path) -> Result<String> {
        self.root
            .relative_key(path)
            .ok_or_else(|| AidbError::InvalidPath {
                path: path.to_path_buf(),
                reason: "outside the storage root".to_string(),
            })
    }

    fn storage_label(&self, path: &Path) -> String {
        self.root
            .relative_key(path)
            .unwrap_or_else(|| path.display().to_string())
    }
}

/// An expanded input path, or the failed outcome of a pattern that could
/// not be expanded (kept in place to preserve input order).
type Expanded = std::result::Result<PathBuf, FileOutcome>;

/// Expands patterns against `cwd`, descending into directories.
fn expand_inputs(cwd: &Path, patterns: &[String]) -> Vec<Expanded> {
    let mut inputs = Vec::new();
    for pattern in patterns {
        match expand_pattern(cwd, pattern) {
            Ok(matches) => {
                for path in matches {
                    let is_dir = fs::symlink_metadata(&path)
                        .map(|m| m.is_dir())
                        .unwrap_or(false);
                    if is_dir {
                        inputs.extend(leaf_files(&path).map(Ok));
                    } else {
                        inputs.push(Ok(path));
                    }
                }
            }
            Err(e) => inputs.push(Err(rejected(cwd, pattern, e))),
        }
    }
    inputs
}

fn rejected(base: &Path, pattern: &str, error: AidbError) -> FileOutcome {
    FileOutcome {
        path: base.join(pattern),
        label: pattern.to_string(),
        outcome: Outcome::Failed(error),
    }
}

fn label_from(cwd: &Path, path: &Path) -> String {
    path.strip_prefix(cwd)
        .unwrap_or(path)
        .display()
        .to_string()
}
