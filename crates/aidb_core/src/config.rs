//! User configuration for aidb.

use crate::collaborator::{NoVersionControl, VersionControl};
use crate::error::{AidbError, Result};
use crate::git::GitCli;
use crate::storage::StorageRoot;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the storage root.
pub const STORAGE_ROOT_ENV: &str = "AIDB_HOME";

/// Default storage directory name under the home directory.
pub const DEFAULT_ROOT_DIR: &str = ".aidb";

/// Keys accepted by [`Config::get`] and [`Config::set`].
pub const CONFIG_KEYS: &[&str] = &["storage.root", "git.enabled", "git.binary"];

/// Comprehensive configuration, stored as TOML.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Storage location.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Version control integration.
    #[serde(default)]
    pub git: GitConfig,
}

impl Config {
    /// Returns the default config file location (`<config_dir>/aidb/config.toml`).
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("aidb").join("config.toml"))
            .ok_or_else(|| AidbError::ConfigError("cannot determine config directory".into()))
    }

    /// Loads configuration from `path`, or defaults if it doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| AidbError::ConfigError(format!("failed to read config: {}", e)))?;
            toml::from_str(&content)
                .map_err(|e| AidbError::ConfigError(format!("failed to parse config: {}", e)))
        } else {
            Ok(Config::default())
        }
    }

    /// Saves configuration to `path` atomically, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AidbError::ConfigError(format!("failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)
            .map_err(|e| AidbError::ConfigError(format!("failed to write config: {}", e)))?;
        Ok(())
    }

    /// Resolves the storage root: `AIDB_HOME`, then `storage.root`, then `~/.aidb`.
    pub fn storage_root(&self) -> Result<StorageRoot> {
        let env = std::env::var_os(STORAGE_ROOT_ENV).filter(|v| !v.is_empty());
        self.storage_root_with(env.map(PathBuf::from))
    }

    /// Resolves the storage root with an explicit environment override.
    pub fn storage_root_with(&self, env_override: Option<PathBuf>) -> Result<StorageRoot> {
        if let Some(path) = env_override {
            return StorageRoot::new(path);
        }
        if let Some(path) = &self.storage.root {
            return StorageRoot::new(expand_home(path));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| AidbError::ConfigError("cannot determine home directory".into()))?;
        StorageRoot::new(home.join(DEFAULT_ROOT_DIR))
    }

    /// Builds the version-control collaborator for `root`.
    pub fn version_control(&self, root: &StorageRoot) -> Box<dyn VersionControl> {
        if self.git.enabled {
            Box::new(GitCli::new(&self.git.binary, root.path()))
        } else {
            Box::new(NoVersionControl)
        }
    }

    /// Returns the value of a dotted key, or `None` if it is unset.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        match key {
            "storage.root" => Ok(self
                .storage
                .root
                .as_ref()
                .map(|p| p.display().to_string())),
            "git.enabled" => Ok(Some(self.git.enabled.to_string())),
            "git.binary" => Ok(Some(self.git.binary.clone())),
            _ => Err(unknown_key(key)),
        }
    }

    /// Sets a dotted key from its string form. An empty `storage.root` unsets it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "storage.root" => {
                self.storage.root = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "git.enabled" => {
                self.git.enabled = value.parse().map_err(|_| {
                    AidbError::ConfigError(format!("git.enabled must be true or false, got {:?}", value))
                })?;
            }
            "git.binary" => {
                if value.is_empty() {
                    return Err(AidbError::ConfigError("git.binary cannot be empty".into()));
                }
                self.git.binary = value.to_string();
            }
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn unknown_key(key: &str) -> AidbError {
    AidbError::ConfigError(format!(
        "unknown key {:?} (expected one of: {})",
        key,
        CONFIG_KEYS.join(", ")
    ))
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

/// Storage location configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StorageConfig {
    /// Storage root directory (default: `~/.aidb`). `~` is expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

/// Version control configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitConfig {
    /// Stage and unstage files in the storage repository (default: true).
    pub enabled: bool,

    /// Git executable (default: "git").
    pub binary: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "git".to_string(),
        }
    }
}
