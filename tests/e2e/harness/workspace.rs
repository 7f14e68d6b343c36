use aidb_core::{MetadataStore, StorageRoot};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated storage root plus a working directory, both under one tempdir.
///
/// Layout: `<tmp>/store` is the storage root, `<tmp>/<work_name>` is where
/// the user's files live.
pub struct TestWorkspace {
    dir: TempDir,
    root: StorageRoot,
    work: PathBuf,
}

impl TestWorkspace {
    /// Create a workspace whose working directory is named `work`.
    pub fn new() -> Result<Self> {
        Self::named("work")
    }

    /// Create a workspace whose working directory has the given name.
    pub fn named(work_name: &str) -> Result<Self> {
        let dir = TempDir::new().context("Failed to create temp directory")?;
        let root = StorageRoot::new(dir.path().join("store"))?;
        let work = dir.path().join(work_name);
        fs::create_dir_all(&work).context("Failed to create work directory")?;
        Ok(Self { dir, root, work })
    }

    /// Temp directory holding everything.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The storage root.
    pub fn root(&self) -> &StorageRoot {
        &self.root
    }

    /// The working directory.
    pub fn work(&self) -> &Path {
        &self.work
    }

    /// Absolute path of `rel` in the working directory.
    pub fn work_path(&self, rel: &str) -> PathBuf {
        self.work.join(rel)
    }

    /// Absolute path of a storage-relative key.
    pub fn stored_path(&self, key: &str) -> PathBuf {
        self.root.join_key(key)
    }

    /// Write a file under the working directory, creating parents.
    pub fn write_file(&self, rel: &str, content: &[u8]) -> Result<PathBuf> {
        let full_path = self.work_path(rel);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directories for {}", rel))?;
        }
        fs::write(&full_path, content).with_context(|| format!("Failed to write file: {}", rel))?;
        Ok(full_path)
    }

    /// Read a file from the working directory (following symlinks).
    pub fn read_file(&self, rel: &str) -> Result<Vec<u8>> {
        let full_path = self.work_path(rel);
        fs::read(&full_path).with_context(|| format!("Failed to read file: {}", rel))
    }

    /// Place a file directly into storage under `key`.
    pub fn write_stored(&self, key: &str, content: &[u8]) -> Result<PathBuf> {
        let full_path = self.stored_path(key);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full_path, content)?;
        Ok(full_path)
    }

    /// Load the ledger from the storage root.
    pub fn ledger(&self) -> Result<MetadataStore> {
        Ok(MetadataStore::load(&self.root)?)
    }

    /// Patterns as owned strings.
    pub fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }
}
