//! Test doubles for the collaborator seams.

use aidb_core::{
    AidbError, Filesystem, RealFilesystem, RepositoryDiscovery, RepositoryInfo, Result,
    VersionControl,
};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

/// Discovery that reports the same repository for every directory.
pub struct FixedDiscovery {
    info: RepositoryInfo,
}

impl FixedDiscovery {
    pub fn new(name: &str, branch: Option<&str>) -> Self {
        Self {
            info: RepositoryInfo {
                name: name.to_string(),
                branch: branch.map(str::to_string),
            },
        }
    }
}

impl RepositoryDiscovery for FixedDiscovery {
    fn discover(&self, _cwd: &Path) -> Option<RepositoryInfo> {
        Some(self.info.clone())
    }
}

/// A call made to [`RecordingVcs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    Stage(PathBuf),
    Unstage(PathBuf),
    IsTracked(PathBuf),
}

/// Version control that records every call and tracks staged paths in memory.
#[derive(Default)]
pub struct RecordingVcs {
    calls: RefCell<Vec<VcsCall>>,
    staged: RefCell<HashSet<PathBuf>>,
    fail_stage: bool,
    fail_unstage: bool,
}

impl RecordingVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `stage` call fails.
    pub fn failing_stage() -> Self {
        Self {
            fail_stage: true,
            ..Self::default()
        }
    }

    /// Every `unstage` call fails.
    pub fn failing_unstage() -> Self {
        Self {
            fail_unstage: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<VcsCall> {
        self.calls.borrow().clone()
    }

    pub fn staged_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, VcsCall::Stage(_)))
            .count()
    }

    pub fn unstaged(&self) -> Vec<PathBuf> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                VcsCall::Unstage(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }
}

fn vcs_error(what: &str) -> AidbError {
    AidbError::Io(io::Error::other(format!("{} rejected by test double", what)))
}

impl VersionControl for RecordingVcs {
    fn stage(&self, path: &Path) -> Result<()> {
        self.calls.borrow_mut().push(VcsCall::Stage(path.to_path_buf()));
        if self.fail_stage {
            return Err(vcs_error("stage"));
        }
        self.staged.borrow_mut().insert(path.to_path_buf());
        Ok(())
    }

    fn unstage(&self, path: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(VcsCall::Unstage(path.to_path_buf()));
        if self.fail_unstage {
            return Err(vcs_error("unstage"));
        }
        self.staged.borrow_mut().remove(path);
        Ok(())
    }

    fn is_tracked(&self, path: &Path) -> Result<bool> {
        self.calls
            .borrow_mut()
            .push(VcsCall::IsTracked(path.to_path_buf()));
        Ok(self.staged.borrow().contains(path))
    }
}

/// Real filesystem with injectable failures.
#[derive(Default)]
pub struct FailingFs {
    fail_symlink: bool,
    /// 1-based index of the move that fails.
    fail_move: Option<usize>,
    moves: Cell<usize>,
}

impl FailingFs {
    /// Symlink creation always fails.
    pub fn symlink_fails() -> Self {
        Self {
            fail_symlink: true,
            ..Self::default()
        }
    }

    /// The `n`th move fails.
    pub fn move_fails(n: usize) -> Self {
        Self {
            fail_move: Some(n),
            ..Self::default()
        }
    }

    /// Symlink creation fails and so does the `n`th move.
    pub fn symlink_and_move_fail(n: usize) -> Self {
        Self {
            fail_symlink: true,
            fail_move: Some(n),
            ..Self::default()
        }
    }
}

impl Filesystem for FailingFs {
    fn move_path(&self, from: &Path, to: &Path) -> io::Result<()> {
        let n = self.moves.get() + 1;
        self.moves.set(n);
        if self.fail_move == Some(n) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "injected move failure"));
        }
        RealFilesystem.move_path(from, to)
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        if self.fail_symlink {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "injected symlink failure"));
        }
        RealFilesystem.symlink(target, link)
    }

    fn remove_symlink(&self, link: &Path) -> io::Result<()> {
        RealFilesystem.remove_symlink(link)
    }
}
