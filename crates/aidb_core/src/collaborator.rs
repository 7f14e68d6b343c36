//! Seams to the version-control system that backs the storage root.
//!
//! The core never needs history, branches or merges. It only asks where the
//! caller's repository is and tells the collaborator which storage paths to
//! stage or unstage. [`crate::GitCli`] implements both traits by shelling out.

use crate::error::Result;
use std::path::Path;

/// Identity of the repository enclosing a working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    /// Repository name (usually the top-level directory name).
    pub name: String,
    /// Current branch or task identifier, if one could be determined.
    pub branch: Option<String>,
}

/// Finds the repository enclosing a directory.
pub trait RepositoryDiscovery {
    /// Returns `None` when `cwd` is not inside a repository.
    ///
    /// Absence is a normal outcome; implementations should not error on it.
    fn discover(&self, cwd: &Path) -> Option<RepositoryInfo>;
}

/// Stages and unstages storage paths in the version-control system.
///
/// Every call is best-effort from the core's point of view: failures are
/// reported as warnings, never as per-file failures.
pub trait VersionControl {
    /// Marks `path` to be included in the next commit.
    fn stage(&self, path: &Path) -> Result<()>;

    /// Stops tracking `path`, keeping its history.
    fn unstage(&self, path: &Path) -> Result<()>;

    /// Returns true if `path` is staged or committed.
    fn is_tracked(&self, path: &Path) -> Result<bool>;
}

/// Discovery that never finds a repository.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRepository;

impl RepositoryDiscovery for NoRepository {
    fn discover(&self, _cwd: &Path) -> Option<RepositoryInfo> {
        None
    }
}

/// Version control that does nothing, for when git integration is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVersionControl;

impl VersionControl for NoVersionControl {
    fn stage(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn unstage(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn is_tracked(&self, _path: &Path) -> Result<bool> {
        Ok(false)
    }
}
