//! CLI commands.

pub mod add;
pub mod config;
pub mod init;
pub mod list;
pub mod output;
pub mod remove;
pub mod seen;
pub mod status;

pub use output::Output;

use aidb_core::{Config, GitCli, MetadataStore, StorageRoot};
use anyhow::{Context, Result};

/// Everything a command needs to talk to the store.
pub struct Session {
    pub config: Config,
    pub root: StorageRoot,
    /// Used for repository discovery in the caller's working directory.
    pub git: GitCli,
}

impl Session {
    /// Loads the user config and resolves the storage root.
    pub fn open() -> Result<Self> {
        let path = Config::default_path()?;
        let config = Config::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        let root = config.storage_root()?;
        let git = GitCli::new(&config.git.binary, root.path());
        Ok(Self { config, root, git })
    }

    /// Loads the seen/unseen ledger. A corrupt ledger aborts the command.
    pub fn ledger(&self) -> Result<MetadataStore> {
        MetadataStore::load(&self.root).map_err(output::with_suggestion)
    }
}
