//! Seen/unseen ledger keyed by storage-relative path.
//!
//! Each entry remembers the content hash a file had when it was last marked
//! seen. A read with a different hash flips the entry back to unseen, so
//! modification detection happens lazily on the next [`MetadataStore::is_seen`]
//! call rather than through a filesystem watcher.

use crate::error::{AidbError, Result};
use crate::storage::StorageRoot;
use crate::TimeProvider;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Ledger format version written by this crate.
pub const LEDGER_VERSION: u32 = 1;

/// Per-file processing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Whether the file has been processed since it last changed.
    pub seen: bool,
    /// Content hash recorded when the file was marked seen.
    pub hash: String,
    /// When the file was marked seen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seen_at: Option<DateTime<Utc>>,
}

/// On-disk ledger document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// Format version.
    pub version: u32,
    /// Entries keyed by storage-relative path with `/` separators.
    #[serde(default)]
    pub files: BTreeMap<String, FileRecord>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            version: LEDGER_VERSION,
            files: BTreeMap::new(),
        }
    }
}

/// Loaded ledger plus the location it is saved back to.
///
/// Mutations are in memory only until [`MetadataStore::save`] is called.
pub struct MetadataStore {
    path: PathBuf,
    ledger: Ledger,
    dirty: bool,
    time_provider: Option<Arc<dyn TimeProvider>>,
}

impl MetadataStore {
    /// Loads the ledger from the storage root.
    ///
    /// A missing ledger file yields an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns `CorruptMetadata` if the file exists but cannot be read or
    /// parsed, or carries an unknown version. The ledger is never silently
    /// reset.
    pub fn load(root: &StorageRoot) -> Result<Self> {
        Self::load_from(root.ledger_path())
    }

    /// Loads the ledger from an explicit file path.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let corrupt = |reason: String| AidbError::CorruptMetadata {
            path: path.clone(),
            reason,
        };

        let ledger = match fs::read(&path) {
            Ok(bytes) => {
                let ledger: Ledger =
                    serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
                if ledger.version == 0 || ledger.version > LEDGER_VERSION {
                    return Err(corrupt(format!(
                        "unsupported ledger version {}",
                        ledger.version
                    )));
                }
                ledger
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ledger::default(),
            Err(e) => return Err(corrupt(e.to_string())),
        };

        debug!(path = %path.display(), entries = ledger.files.len(), "loaded ledger");

        Ok(Self {
            path,
            ledger,
            dirty: false,
            time_provider: None,
        })
    }

    /// Sets a custom time provider for `seenAt` timestamps.
    pub fn with_time_provider(mut self, provider: impl TimeProvider + 'static) -> Self {
        self.time_provider = Some(Arc::new(provider));
        self
    }

    /// Returns the ledger file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the ledger version.
    pub fn version(&self) -> u32 {
        self.ledger.version
    }

    /// Returns true if there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.ledger.files.len()
    }

    /// Returns true if the ledger has no entries.
    pub fn is_empty(&self) -> bool {
        self.ledger.files.is_empty()
    }

    /// Returns the stored record for `key`, without any hash check.
    pub fn get(&self, key: &str) -> Option<&FileRecord> {
        self.ledger.files.get(key)
    }

    /// Records `key` as seen with `hash`, stamped with the current time.
    pub fn mark_seen(&mut self, key: &str, hash: &str) {
        let record = FileRecord {
            seen: true,
            hash: hash.to_string(),
            seen_at: Some(self.now()),
        };
        self.ledger.files.insert(key.to_string(), record);
        self.dirty = true;
    }

    /// Clears the seen flag, keeping the stored hash. Unknown keys are ignored.
    pub fn mark_unseen(&mut self, key: &str) {
        if let Some(record) = self.ledger.files.get_mut(key) {
            if record.seen {
                record.seen = false;
                self.dirty = true;
            }
        }
    }

    /// Returns whether `key` is seen at `current_hash`.
    ///
    /// An entry whose stored hash differs is flipped to unseen as a side
    /// effect, so a later read with the same hash cannot report a stale
    /// `true`.
    pub fn is_seen(&mut self, key: &str, current_hash: &str) -> bool {
        let Some(record) = self.ledger.files.get_mut(key) else {
            return false;
        };

        if record.hash != current_hash {
            if record.seen {
                debug!(key, stored = %record.hash, current = current_hash, "content changed, invalidating");
                record.seen = false;
                self.dirty = true;
            }
            return false;
        }

        record.seen
    }

    /// Deletes the entry for `key`. Unknown keys are ignored.
    pub fn remove(&mut self, key: &str) {
        if self.ledger.files.remove(key).is_some() {
            self.dirty = true;
        }
    }

    /// Writes the ledger to disk.
    ///
    /// Uses temp file + fsync + rename so readers never observe a partial
    /// file. Parent directories are created as needed. Two concurrent
    /// writers race and the last rename wins.
    ///
    /// # Errors
    ///
    /// Returns `PersistFailure` if any step fails; in-memory changes are
    /// kept so the caller can report them as lost.
    pub fn save(&mut self) -> Result<()> {
        self.write_atomic().map_err(|e| AidbError::PersistFailure {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        self.dirty = false;
        debug!(path = %self.path.display(), entries = self.ledger.files.len(), "saved ledger");
        Ok(())
    }

    fn write_atomic(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_vec_pretty(&self.ledger).map_err(io::Error::other)?;
        let tmp_path = self.path.with_extension("json.tmp");

        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&data)?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        #[cfg(unix)]
        {
            if let Some(parent) = self.path.parent() {
                if let Ok(dir_file) = File::open(parent) {
                    let _ = dir_file.sync_all();
                }
            }
        }

        Ok(())
    }

    fn now(&self) -> DateTime<Utc> {
        match &self.time_provider {
            Some(provider) => provider.now(),
            None => Utc::now(),
        }
    }
}
