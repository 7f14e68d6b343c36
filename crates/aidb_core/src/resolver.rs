//! Storage path derivation from the caller's working directory.

use crate::collaborator::RepositoryDiscovery;
use crate::error::{AidbError, Result};
use crate::storage::StorageRoot;
use std::cell::RefCell;
use std::path::{Component, Path, PathBuf};

/// Branch used when no repository (or no branch) is found.
pub const DEFAULT_BRANCH: &str = "main";

/// Project identity derived from a working directory.
///
/// Both fields are single, filesystem-safe path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    /// Repository name, or the working directory's name outside a repository.
    pub repository: String,
    /// Current branch or task identifier.
    pub branch: String,
}

impl ProjectContext {
    /// Builds a context, sanitizing both segments.
    ///
    /// Path separators become `-` (so `feature/x` maps to `feature-x`).
    ///
    /// # Errors
    ///
    /// Returns `InvalidContext` if a segment is empty, `.` or `..` after
    /// sanitizing, or contains a NUL byte.
    pub fn new(repository: &str, branch: &str) -> Result<Self> {
        Ok(Self {
            repository: sanitize_segment(repository, "repository")?,
            branch: sanitize_segment(branch, "branch")?,
        })
    }

    /// Returns `<repository>/<branch>` relative to the storage root.
    pub fn relative_dir(&self) -> PathBuf {
        Path::new(&self.repository).join(&self.branch)
    }
}

fn sanitize_segment(raw: &str, what: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.contains('\0') {
        return Err(AidbError::InvalidContext(format!(
            "{} name contains a NUL byte",
            what
        )));
    }

    let cleaned: String = trimmed
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return Err(AidbError::InvalidContext(format!(
            "{} name {:?} is not a usable directory name",
            what, raw
        )));
    }

    Ok(cleaned)
}

/// Computes where a file lives inside the storage root.
///
/// The result is `root/<repository>/<branch>/<filename>`. Repository identity
/// comes from the injected [`RepositoryDiscovery`]; the last lookup is cached
/// because a batch resolves many files from the same directory.
pub struct PathResolver<'a> {
    root: &'a StorageRoot,
    discovery: &'a dyn RepositoryDiscovery,
    cached: RefCell<Option<(PathBuf, ProjectContext)>>,
}

impl<'a> PathResolver<'a> {
    /// Creates a resolver for the given storage root.
    pub fn new(root: &'a StorageRoot, discovery: &'a dyn RepositoryDiscovery) -> Self {
        Self {
            root,
            discovery,
            cached: RefCell::new(None),
        }
    }

    /// Derives the project context for `cwd`.
    ///
    /// Inside a repository: its name and current branch (or `main`).
    /// Otherwise: the directory's own name and `main`.
    pub fn project_context(&self, cwd: &Path) -> Result<ProjectContext> {
        if let Some((dir, ctx)) = self.cached.borrow().as_ref() {
            if dir == cwd {
                return Ok(ctx.clone());
            }
        }

        let ctx = match self.discovery.discover(cwd) {
            Some(repo) => {
                let branch = repo.branch.as_deref().unwrap_or(DEFAULT_BRANCH);
                ProjectContext::new(&repo.name, branch)?
            }
            None => {
                let name = cwd
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                ProjectContext::new(&name, DEFAULT_BRANCH)?
            }
        };

        *self.cached.borrow_mut() = Some((cwd.to_path_buf(), ctx.clone()));
        Ok(ctx)
    }

    /// Resolves the storage path for `filename` as seen from `cwd`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidContext` if the project context is unsafe, and
    /// `InvalidPath` if `filename` is absolute, empty, or climbs out of the
    /// project directory with `..`.
    pub fn resolve_storage_path(&self, cwd: &Path, filename: &Path) -> Result<PathBuf> {
        let ctx = self.project_context(cwd)?;
        self.resolve_in(&ctx, filename)
    }

    /// Resolves `filename` inside an already-derived project context.
    pub fn resolve_in(&self, ctx: &ProjectContext, filename: &Path) -> Result<PathBuf> {
        let relative = confine(filename)?;
        Ok(self.root.path().join(ctx.relative_dir()).join(relative))
    }
}

/// Normalizes a relative filename, refusing anything that escapes its base.
fn confine(filename: &Path) -> Result<PathBuf> {
    let invalid = |reason: &str| AidbError::InvalidPath {
        path: filename.to_path_buf(),
        reason: reason.to_string(),
    };

    let mut out = PathBuf::new();
    for component in filename.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return Err(invalid("escapes the project directory"));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("must be relative"));
            }
        }
    }

    if out.as_os_str().is_empty() {
        return Err(invalid("empty file name"));
    }

    Ok(out)
}
