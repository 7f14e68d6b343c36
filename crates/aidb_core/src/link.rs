//! Relocating files into storage and replacing them with symlinks.
//!
//! Both directions are two-step (move, then link; or unlink, then move) and
//! undo the first step if the second fails. When the undo fails as well the
//! result is [`AidbError::PartialRollbackFailure`], which needs manual repair.

use crate::collaborator::RepositoryDiscovery;
use crate::error::{AidbError, Result};
use crate::resolver::PathResolver;
use crate::storage::{normalize, StorageRoot};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// `EXDEV`: rename across filesystems (same value on Linux and macOS).
#[cfg(unix)]
const EXDEV: i32 = 18;

/// Filesystem primitives used by [`LinkManager`].
///
/// Exists so tests can force individual steps to fail.
pub trait Filesystem {
    /// Moves a file, preserving its bytes exactly.
    fn move_path(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Creates a symlink at `link` pointing to `target`.
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    /// Removes the symlink at `link` (never its target).
    fn remove_symlink(&self, link: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFilesystem;

impl Filesystem for RealFilesystem {
    fn move_path(&self, from: &Path, to: &Path) -> io::Result<()> {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(e) if is_cross_device(&e) => {
                debug!(from = %from.display(), to = %to.display(), "rename crosses devices, copying");
                copy_then_remove(from, to)
            }
            Err(e) => Err(e),
        }
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(target, link)
        }
        #[cfg(windows)]
        {
            std::os::windows::fs::symlink_file(target, link)
        }
    }

    fn remove_symlink(&self, link: &Path) -> io::Result<()> {
        fs::remove_file(link)
    }
}

/// Copies `from` to `to` and removes `from`. On any failure `to` is removed
/// again so a retry does not find a partial destination.
fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    let result = fs::copy(from, to).and_then(|_| fs::remove_file(from));
    if result.is_err() {
        let _ = fs::remove_file(to);
    }
    result
}

fn is_cross_device(err: &io::Error) -> bool {
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(EXDEV)
    }
    #[cfg(not(unix))]
    {
        let _ = err;
        false
    }
}

/// Reads a symlink and returns its target as an absolute, normalized path.
///
/// Relative targets are resolved against the link's parent directory.
/// Returns `None` if `path` is not a symlink.
pub fn resolve_link(path: &Path) -> Option<PathBuf> {
    let target = fs::read_link(path).ok()?;
    let absolute = if target.is_absolute() {
        target
    } else {
        path.parent().unwrap_or(Path::new("")).join(target)
    };
    Some(normalize(&absolute))
}

/// Moves files into the storage root and links them back.
pub struct LinkManager<'a> {
    root: &'a StorageRoot,
    resolver: PathResolver<'a>,
    fs: Box<dyn Filesystem + 'a>,
}

impl<'a> LinkManager<'a> {
    /// Creates a link manager operating on the real filesystem.
    pub fn new(root: &'a StorageRoot, discovery: &'a dyn RepositoryDiscovery) -> Self {
        Self {
            root,
            resolver: PathResolver::new(root, discovery),
            fs: Box::new(RealFilesystem),
        }
    }

    /// Replaces the filesystem primitives (for failure injection in tests).
    pub fn with_filesystem(mut self, fs: impl Filesystem + 'a) -> Self {
        self.fs = Box::new(fs);
        self
    }

    /// Moves `source` into storage and leaves a symlink in its place.
    ///
    /// The storage location is derived from `cwd` (project context) and the
    /// source's path relative to `cwd`; sources outside `cwd` use their file
    /// name. Returns the storage path.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `source` does not exist
    /// - `AlreadyLinked` if `source` already links into the storage root
    /// - `ForeignSymlink` if `source` is any other symlink
    /// - `IsDirectory` if `source` is a directory
    /// - `AlreadyTracked` if the destination is occupied
    /// - `MoveFailed` if the content could not be moved (nothing changed)
    /// - `LinkFailed` if the symlink failed and the content was moved back
    /// - `PartialRollbackFailure` if the symlink failed and moving back did too
    pub fn track(&self, source: &Path, cwd: &Path) -> Result<PathBuf> {
        let source = normalize(source);
        let meta = fs::symlink_metadata(&source).map_err(|e| not_found_or_io(e, &source))?;

        if meta.file_type().is_symlink() {
            let target = resolve_link(&source).unwrap_or_default();
            if self.root.contains(&target) {
                return Err(AidbError::AlreadyLinked {
                    path: source,
                    target,
                });
            }
            return Err(AidbError::ForeignSymlink {
                path: source,
                target,
            });
        }

        if meta.is_dir() {
            return Err(AidbError::IsDirectory { path: source });
        }

        if self.root.contains(&source) {
            return Err(AidbError::InvalidPath {
                path: source,
                reason: "already inside the storage root".to_string(),
            });
        }

        let filename = match source.strip_prefix(cwd) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => source
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_default(),
        };
        let destination = self.resolver.resolve_storage_path(cwd, &filename)?;

        if fs::symlink_metadata(&destination).is_ok() {
            return Err(AidbError::AlreadyTracked { path: destination });
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        self.fs
            .move_path(&source, &destination)
            .map_err(|e| AidbError::MoveFailed {
                from: source.clone(),
                to: destination.clone(),
                source: e,
            })?;

        if let Err(link_err) = self.fs.symlink(&destination, &source) {
            warn!(path = %source.display(), error = %link_err, "symlink failed, moving content back");
            return match self.fs.move_path(&destination, &source) {
                Ok(()) => Err(AidbError::LinkFailed {
                    path: source,
                    source: link_err,
                }),
                Err(rollback_err) => Err(AidbError::PartialRollbackFailure {
                    operation: "track",
                    original: source,
                    storage: destination,
                    error: link_err.to_string(),
                    rollback_error: rollback_err.to_string(),
                }),
            };
        }

        info!(from = %source.display(), to = %destination.display(), "tracked");
        Ok(destination)
    }

    /// Removes the symlink at `original` and moves the stored content back.
    ///
    /// Returns the storage path the content came from.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `original` does not exist
    /// - `NotTracked` if `original` is not a symlink into the storage root
    /// - `MissingStorageFile` if the symlink dangles
    /// - `MoveFailed` if the content could not be moved back (symlink restored)
    /// - `PartialRollbackFailure` if the symlink could not be restored either
    pub fn untrack(&self, original: &Path) -> Result<PathBuf> {
        let original = normalize(original);
        let meta = fs::symlink_metadata(&original).map_err(|e| not_found_or_io(e, &original))?;

        if !meta.file_type().is_symlink() {
            return Err(AidbError::NotTracked { path: original });
        }

        let storage = match resolve_link(&original) {
            Some(target) if self.root.contains(&target) => target,
            _ => return Err(AidbError::NotTracked { path: original }),
        };

        if fs::symlink_metadata(&storage).is_err() {
            return Err(AidbError::MissingStorageFile { path: storage });
        }

        self.fs.remove_symlink(&original)?;

        if let Err(move_err) = self.fs.move_path(&storage, &original) {
            warn!(path = %original.display(), error = %move_err, "move back failed, restoring symlink");
            return match self.fs.symlink(&storage, &original) {
                Ok(()) => Err(AidbError::MoveFailed {
                    from: storage,
                    to: original,
                    source: move_err,
                }),
                Err(rollback_err) => Err(AidbError::PartialRollbackFailure {
                    operation: "untrack",
                    original,
                    storage,
                    error: move_err.to_string(),
                    rollback_error: rollback_err.to_string(),
                }),
            };
        }

        info!(from = %storage.display(), to = %original.display(), "untracked");
        Ok(storage)
    }
}

fn not_found_or_io(err: io::Error, path: &Path) -> AidbError {
    if err.kind() == io::ErrorKind::NotFound {
        AidbError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        AidbError::Io(err)
    }
}
