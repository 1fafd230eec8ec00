//! On-device persistent storage.
//!
//! The browser-profile equivalent for a native client: a directory of
//! JSON files, one per fixed key. Reads are best-effort - a missing or
//! corrupt entry behaves as absent (logged, never an error) - and writes
//! go through a temp file renamed into place so a crash cannot leave a
//! half-written entry behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

/// Fixed storage keys.
pub mod keys {
    /// The serialized local cart (guest carts and server-cart fallback).
    pub const CART: &str = "cart";

    /// The persisted bearer token.
    pub const AUTH_TOKEN: &str = "auth_token";

    /// The persisted user record for session restoration.
    pub const CURRENT_USER: &str = "current_user";

    /// The most recently completed order, for the confirmation view.
    pub const LAST_ORDER: &str = "last_order";
}

/// Error opening the store. Read/write failures after open are logged and
/// degrade to absent values instead of erroring.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A fixed-key JSON file store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Open (creating if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Read and decode the value under `key`.
    ///
    /// Missing entries and entries that fail to decode both yield `None`;
    /// corruption is logged and otherwise indistinguishable from absence.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return None,
            Err(error) => {
                warn!(key, %error, "failed to read stored entry, treating as absent");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(key, %error, "stored entry is corrupt, treating as absent");
                None
            }
        }
    }

    /// Whether any entry (valid or not) exists under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.path(key).exists()
    }

    /// Encode and persist `value` under `key`.
    ///
    /// Best-effort: failures are logged, mirroring the fire-and-forget
    /// semantics of browser storage writes.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(error) => {
                warn!(key, %error, "failed to encode value for storage");
                return;
            }
        };

        if let Err(error) = write_atomically(&self.path(key), &json) {
            warn!(key, %error, "failed to persist entry");
        }
    }

    /// Remove the entry under `key`, if present.
    pub fn remove(&self, key: &str) {
        if let Err(error) = fs::remove_file(self.path(key))
            && error.kind() != io::ErrorKind::NotFound
        {
            warn!(key, %error, "failed to remove stored entry");
        }
    }
}

/// Write via a sibling temp file and rename into place.
fn write_atomically(path: &Path, contents: &str) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::temp_dir;

    #[test]
    fn test_round_trip() {
        let store = LocalStore::open(temp_dir()).unwrap();
        store.set("answer", &42_u32);
        assert_eq!(store.get::<u32>("answer"), Some(42));
        assert!(store.contains("answer"));
    }

    #[test]
    fn test_missing_is_none() {
        let store = LocalStore::open(temp_dir()).unwrap();
        assert_eq!(store.get::<u32>("nothing"), None);
        assert!(!store.contains("nothing"));
    }

    #[test]
    fn test_corrupt_is_none_but_present() {
        let store = LocalStore::open(temp_dir()).unwrap();
        std::fs::write(store.path("cart"), "{not json").unwrap();
        assert_eq!(store.get::<Vec<u32>>("cart"), None);
        assert!(store.contains("cart"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = LocalStore::open(temp_dir()).unwrap();
        store.set("gone", &1_u8);
        store.remove("gone");
        store.remove("gone");
        assert_eq!(store.get::<u8>("gone"), None);
    }
}
