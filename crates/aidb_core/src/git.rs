//! Git command-line collaborator.

use crate::collaborator::{RepositoryDiscovery, RepositoryInfo, VersionControl};
use crate::error::{AidbError, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Runs the `git` binary for repository discovery and for staging inside
/// the storage root.
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: String,
    /// Repository that `stage`/`unstage` operate on (the storage root).
    repo_dir: PathBuf,
}

impl GitCli {
    /// Creates a collaborator that stages into the repository at `repo_dir`.
    pub fn new(binary: impl Into<String>, repo_dir: impl AsRef<Path>) -> Self {
        Self {
            binary: binary.into(),
            repo_dir: repo_dir.as_ref().to_path_buf(),
        }
    }

    /// Returns true if the git binary can be executed.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Initializes the storage repository with `main` as its default branch.
    ///
    /// Existing repositories are left alone. A `remote` URL is added as
    /// `origin`, or replaces the current `origin` URL if it differs.
    pub fn init_repository(&self, remote: Option<&str>) -> Result<()> {
        std::fs::create_dir_all(&self.repo_dir)?;

        if !self.repo_dir.join(".git").exists() {
            self.run_checked(&["init"])?;
            // Fails harmlessly when there are no commits yet on older git.
            let _ = self.run(&["branch", "-M", "main"]);
        }

        if let Some(url) = remote {
            match self.run(&["remote", "get-url", "origin"]) {
                Ok(out) if out.status.success() => {
                    let existing = String::from_utf8_lossy(&out.stdout).trim().to_string();
                    if existing != url {
                        self.run_checked(&["remote", "set-url", "origin", url])?;
                    }
                }
                _ => self.run_checked(&["remote", "add", "origin", url])?,
            }
        }

        Ok(())
    }

    fn run(&self, args: &[&str]) -> io::Result<Output> {
        Command::new(&self.binary)
            .arg("-C")
            .arg(&self.repo_dir)
            .args(args)
            .output()
    }

    fn run_checked(&self, args: &[&str]) -> Result<()> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AidbError::Io(io::Error::other(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            ))));
        }
        Ok(())
    }

    fn query(&self, dir: &Path, args: &[&str]) -> Option<String> {
        let output = Command::new(&self.binary)
            .arg("-C")
            .arg(dir)
            .args(args)
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl RepositoryDiscovery for GitCli {
    fn discover(&self, cwd: &Path) -> Option<RepositoryInfo> {
        let toplevel = self.query(cwd, &["rev-parse", "--show-toplevel"])?;
        let name = Path::new(&toplevel)
            .file_name()?
            .to_string_lossy()
            .into_owned();
        // Detached HEAD reports "HEAD", which falls back to the default branch
        let branch = self
            .query(cwd, &["rev-parse", "--abbrev-ref", "HEAD"])
            .filter(|b| b != "HEAD");

        debug!(cwd = %cwd.display(), %name, ?branch, "discovered repository");
        Some(RepositoryInfo { name, branch })
    }
}

impl VersionControl for GitCli {
    fn stage(&self, path: &Path) -> Result<()> {
        let arg = path.to_string_lossy();
        self.run_checked(&["add", "--", &*arg])
    }

    fn unstage(&self, path: &Path) -> Result<()> {
        let arg = path.to_string_lossy();
        self.run_checked(&["rm", "--cached", "--quiet", "--", &*arg])
    }

    fn is_tracked(&self, path: &Path) -> Result<bool> {
        let arg = path.to_string_lossy();
        let output = self.run(&["ls-files", "--error-unmatch", "--", &*arg])?;
        Ok(output.status.success())
    }
}
