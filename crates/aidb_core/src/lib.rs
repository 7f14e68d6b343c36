//! aidb Core Library
//!
//! A personal knowledge-file tracker for AI agent workflows, providing:
//! - Relocation of files into a central storage root, replaced by symlinks
//! - Per-project, per-branch storage layout
//! - A seen/unseen ledger keyed by content hash
//! - Version-control staging as a pluggable collaborator
//! - Freshness checks for per-directory LEARN.md summaries
//!
//! # Quick Start
//!
//! ```no_run
//! use aidb_core::{MetadataStore, NoRepository, NoVersionControl, StorageRoot, TrackingService};
//! use std::path::Path;
//!
//! let root = StorageRoot::new("/home/me/.aidb").unwrap();
//! let service = TrackingService::new(&root, &NoRepository, &NoVersionControl);
//!
//! // Move TASK.md into storage and leave a symlink behind
//! let report = service
//!     .add(Path::new("/home/me/ideas"), &["TASK.md".to_string()])
//!     .unwrap();
//! assert_eq!(report.failed(), 0);
//!
//! // Record it as processed
//! let mut ledger = MetadataStore::load(&root).unwrap();
//! service
//!     .mark_seen(&["ideas/main/TASK.md".to_string()], &mut ledger)
//!     .unwrap();
//! ```
//!
//! # Seen/Unseen Tracking
//!
//! The ledger stores the content hash a file had when it was marked seen.
//! Reading with a different hash flips the entry back to unseen:
//!
//! ```
//! use aidb_core::MetadataStore;
//! use tempfile::TempDir;
//!
//! let tmp = TempDir::new().unwrap();
//! let mut ledger = MetadataStore::load_from(tmp.path().join(".metadata.json")).unwrap();
//!
//! ledger.mark_seen("proj/main/TASK.md", "blake3:aa");
//! assert!(ledger.is_seen("proj/main/TASK.md", "blake3:aa"));
//! assert!(!ledger.is_seen("proj/main/TASK.md", "blake3:bb"));
//! assert!(!ledger.is_seen("proj/main/TASK.md", "blake3:aa"));
//! ```

mod collaborator;
mod config;
mod digest;
mod error;
mod git;
mod learn;
mod link;
mod metadata;
mod resolver;
mod storage;
mod tracking;
mod walk;

pub use collaborator::{
    NoRepository, NoVersionControl, RepositoryDiscovery, RepositoryInfo, VersionControl,
};
pub use config::{
    Config, GitConfig, StorageConfig, CONFIG_KEYS, DEFAULT_ROOT_DIR, STORAGE_ROOT_ENV,
};
pub use digest::{hash_content, ContentHash};
pub use error::{AidbError, Result};
pub use git::GitCli;
pub use learn::{
    learn_status, marker_for, tree_digest, LearnStatus, LEARN_FILE_NAME, MARKER_HEX_LEN,
};
pub use link::{resolve_link, Filesystem, LinkManager, RealFilesystem};
pub use metadata::{FileRecord, Ledger, MetadataStore, LEDGER_VERSION};
pub use resolver::{PathResolver, ProjectContext, DEFAULT_BRANCH};
pub use storage::{StorageRoot, LEDGER_FILE_NAME};
pub use tracking::{
    BatchReport, FileOutcome, ListEntry, ListFilter, Outcome, ProgressCallback, TrackingService,
    Warning,
};
pub use walk::{expand_pattern, leaf_files, stored_files};

use chrono::{DateTime, Utc};

/// Time provider trait for testing.
///
/// Allows injecting controlled time into the ledger so `seenAt` stamps are
/// predictable. Only used when explicitly set via `with_time_provider()`.
pub trait TimeProvider: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

impl<F> TimeProvider for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}
