//! The storage root under which all tracked content lives.

use crate::error::Result;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// File name of the metadata ledger, directly under the storage root.
pub const LEDGER_FILE_NAME: &str = ".metadata.json";

/// Absolute directory holding every tracked file.
///
/// Constructed once per invocation and passed explicitly to every component.
/// The directory itself is created lazily by [`StorageRoot::ensure`].
///
/// # Examples
///
/// ```
/// use aidb_core::StorageRoot;
///
/// let root = StorageRoot::new("/home/me/.aidb").unwrap();
/// assert!(root.contains("/home/me/.aidb/proj/main/a.md"));
/// assert!(!root.contains("/home/me/.aidbx/a.md"));
/// assert_eq!(
///     root.relative_key("/home/me/.aidb/proj/main/a.md").as_deref(),
///     Some("proj/main/a.md")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot {
    path: PathBuf,
}

impl StorageRoot {
    /// Creates a storage root, anchoring relative paths at the current directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        Ok(Self {
            path: normalize(&absolute),
        })
    }

    /// Returns the root directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the root directory if it doesn't exist.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.path)?;
        Ok(())
    }

    /// Returns the location of the metadata ledger.
    pub fn ledger_path(&self) -> PathBuf {
        self.path.join(LEDGER_FILE_NAME)
    }

    /// Returns true if `path` is the root or lies beneath it.
    ///
    /// Comparison is by path component after lexical normalization, so
    /// `..` segments cannot smuggle a path out of the root and a sibling
    /// directory sharing a name prefix never matches.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        normalize(path.as_ref()).starts_with(&self.path)
    }

    /// Returns the storage-relative key for `path` with `/` separators.
    ///
    /// Returns `None` for paths outside the root and for the root itself.
    pub fn relative_key(&self, path: impl AsRef<Path>) -> Option<String> {
        let normalized = normalize(path.as_ref());
        let rel = normalized.strip_prefix(&self.path).ok()?;

        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }

    /// Joins a storage-relative key back onto the root.
    pub fn join_key(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.path.clone(), |acc, part| acc.join(part))
    }
}

/// Lexically normalizes a path: drops `.` and folds `..` into its parent.
///
/// `..` at the root stays at the root. No filesystem access.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // Nothing above the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}
