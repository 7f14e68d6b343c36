//! Content digests for modification detection.

use crate::error::{AidbError, Result};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use std::str::FromStr;

/// A content digest in `"<algorithm>:<hex>"` form.
///
/// Digests produced by [`hash_content`] are BLAKE3 over the raw file bytes.
/// Parsing accepts any algorithm name so ledgers written with another
/// algorithm still load; such entries simply never match a fresh digest.
///
/// # Examples
///
/// ```
/// use aidb_core::ContentHash;
///
/// let hash: ContentHash = "sha256:deadbeef".parse().unwrap();
/// assert_eq!(hash.algorithm(), "sha256");
/// assert_eq!(hash.hex(), "deadbeef");
/// assert_eq!(hash.to_string(), "sha256:deadbeef");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    /// Algorithm name used by [`hash_content`].
    pub const ALGORITHM: &'static str = "blake3";

    /// Length of a BLAKE3 digest as a hex string.
    pub const HEX_LEN: usize = 64;

    /// Builds a BLAKE3 digest from raw hash bytes.
    pub fn from_blake3(bytes: [u8; 32]) -> Self {
        Self(format!("{}:{}", Self::ALGORITHM, hex::encode(bytes)))
    }

    /// Returns the algorithm name (the part before the colon).
    pub fn algorithm(&self) -> &str {
        self.0.split_once(':').map(|(alg, _)| alg).unwrap_or("")
    }

    /// Returns the lowercase hex digest (the part after the colon).
    pub fn hex(&self) -> &str {
        self.0.split_once(':').map(|(_, hex)| hex).unwrap_or("")
    }

    /// Returns the full `"<algorithm>:<hex>"` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentHash {
    type Err = AidbError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (alg, digest) = s.split_once(':').ok_or_else(|| AidbError::InvalidDigest {
            value: s.to_string(),
            reason: "expected <algorithm>:<hex>".to_string(),
        })?;

        if alg.is_empty() || digest.is_empty() {
            return Err(AidbError::InvalidDigest {
                value: s.to_string(),
                reason: "empty algorithm or digest".to_string(),
            });
        }

        hex::decode(digest).map_err(|e| AidbError::InvalidDigest {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self(format!("{}:{}", alg, digest.to_ascii_lowercase())))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.hex();
        write!(f, "ContentHash({}:{}...)", self.algorithm(), &hex[..hex.len().min(12)])
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Computes the content digest of the file at `path`.
///
/// The file is streamed through the hasher byte for byte, so identical
/// content yields identical digests on every platform.
///
/// # Errors
///
/// Returns `NotFound` if the file is missing or cannot be read.
pub fn hash_content(path: impl AsRef<Path>) -> Result<ContentHash> {
    let path = path.as_ref();
    let not_found = |_: io::Error| AidbError::NotFound {
        path: path.to_path_buf(),
    };

    let mut file = File::open(path).map_err(not_found)?;
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut file, &mut hasher).map_err(not_found)?;

    Ok(ContentHash::from_blake3(*hasher.finalize().as_bytes()))
}
