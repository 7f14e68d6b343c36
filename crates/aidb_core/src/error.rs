//! Error types for aidb_core operations.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for aidb_core operations.
#[derive(Error, Debug)]
pub enum AidbError {
    /// Project or branch derivation produced an unsafe or empty path segment.
    #[error("invalid project context: {0}")]
    InvalidContext(String),

    /// A filename would resolve outside its project directory.
    #[error("invalid path {}: {}", path.display(), reason)]
    InvalidPath {
        /// The offending path as given
        path: PathBuf,
        /// Why it was rejected
        reason: String,
    },

    /// The source is already a symlink into the storage root.
    #[error("already tracked: {} -> {}", path.display(), target.display())]
    AlreadyLinked {
        /// The symlink path
        path: PathBuf,
        /// Where the symlink points
        target: PathBuf,
    },

    /// A file already occupies the destination inside the storage root.
    #[error("already exists in storage: {}", path.display())]
    AlreadyTracked {
        /// The occupied storage path
        path: PathBuf,
    },

    /// The path is not a symlink into the storage root.
    #[error("not a tracked file: {}", path.display())]
    NotTracked {
        /// The path that was expected to be a tracked symlink
        path: PathBuf,
    },

    /// The source is a symlink that points somewhere other than the storage root.
    #[error("is a symlink to {}: {}", target.display(), path.display())]
    ForeignSymlink {
        /// The symlink path
        path: PathBuf,
        /// Where the symlink points
        target: PathBuf,
    },

    /// A tracked symlink points at a storage file that no longer exists.
    #[error("storage file missing: {}", path.display())]
    MissingStorageFile {
        /// The missing storage path
        path: PathBuf,
    },

    /// The metadata ledger could not be read or parsed.
    #[error("corrupt metadata at {}: {}", path.display(), reason)]
    CorruptMetadata {
        /// Path to the ledger file
        path: PathBuf,
        /// Description of the problem
        reason: String,
    },

    /// The metadata ledger could not be written.
    #[error("failed to persist metadata to {}: {}", path.display(), reason)]
    PersistFailure {
        /// Path to the ledger file
        path: PathBuf,
        /// Description of the write failure
        reason: String,
    },

    /// A move failed and so did the attempt to undo it.
    #[error(
        "{operation} failed and rollback also failed ({} <-> {}): {error}; rollback: {rollback_error}",
        original.display(),
        storage.display()
    )]
    PartialRollbackFailure {
        /// Which operation was in progress ("track" or "untrack")
        operation: &'static str,
        /// The user-facing location
        original: PathBuf,
        /// The storage location
        storage: PathBuf,
        /// The failure that triggered the rollback
        error: String,
        /// The failure of the rollback itself
        rollback_error: String,
    },

    /// Symlink creation failed; the content was moved back.
    #[error("failed to create symlink at {}: {}", path.display(), source)]
    LinkFailed {
        /// Where the symlink should have been created
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Moving content failed; the tracked state was left as it was.
    #[error("failed to move {} to {}: {}", from.display(), to.display(), source)]
    MoveFailed {
        /// Move source
        from: PathBuf,
        /// Move destination
        to: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Directories are tracked file by file, never as a unit.
    #[error("is a directory: {}", path.display())]
    IsDirectory {
        /// The directory path
        path: PathBuf,
    },

    /// File is missing or unreadable.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// The missing path
        path: PathBuf,
    },

    /// A glob pattern could not be parsed.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The pattern text
        pattern: String,
        /// Parser message
        reason: String,
    },

    /// A content hash string is not `<algorithm>:<hex>`.
    #[error("invalid content hash {value:?}: {reason}")]
    InvalidDigest {
        /// The rejected text
        value: String,
        /// What was wrong with it
        reason: String,
    },

    /// Configuration error (loading, parsing, invalid values).
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AidbError {
    /// Returns true for errors on the shared ledger, which abort a whole invocation.
    pub fn is_ledger_error(&self) -> bool {
        matches!(
            self,
            Self::CorruptMetadata { .. } | Self::PersistFailure { .. }
        )
    }

    /// Returns true when the tracked state was left inconsistent and needs manual repair.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PartialRollbackFailure { .. })
    }

    /// Returns a user-friendly recovery suggestion for the error, if available.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::PartialRollbackFailure { .. } => Some(
                "Both locations may hold partial state. Check the original and storage paths and move the file back by hand.",
            ),
            Self::MissingStorageFile { .. } => Some(
                "The storage root was modified outside aidb. Restore the file from version control history or delete the dangling symlink.",
            ),
            Self::CorruptMetadata { .. } => Some(
                "Fix or move aside .metadata.json in the storage root. aidb will not reset it automatically.",
            ),
            Self::PersistFailure { .. } => {
                Some("Check permissions and free space in the storage root, then rerun the command.")
            }
            Self::InvalidContext(_) => {
                Some("Run from a directory whose name (and branch name) is a plain path segment.")
            }
            Self::AlreadyTracked { .. } => Some(
                "A file with this name is already stored for this project and branch. Rename one of them.",
            ),
            Self::ForeignSymlink { .. } => Some("Only regular files can be tracked."),
            _ => None,
        }
    }
}

/// Convenience Result type for aidb_core operations.
pub type Result<T> = std::result::Result<T, AidbError>;
