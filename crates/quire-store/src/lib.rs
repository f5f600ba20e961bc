//! Durable local key-value store for quire.
//!
//! This crate provides the persistence primitive used by the sync layer for
//! its cache mirror, draft list and autosave buffer:
//!
//! - [`KvStore`]: `get`/`set`/`remove`/`list_keys_with_prefix` over string values
//! - [`KvStoreExt`]: JSON convenience methods via a blanket impl
//!
//! # Implementations
//!
//! - [`MemoryStore`]: In-memory map (tests, ephemeral sessions)
//! - [`FileStore`]: One file per key below a root directory, with version validation
//!
//! Each individual `set` is crash-consistent: a reader sees either the old
//! or the new value, never a torn write. No ordering is promised across keys.
//!
//! # Example
//!
//! ```
//! use quire_store::{KvStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.set("drafts/blog/1", "{}").unwrap();
//! assert_eq!(store.list_keys_with_prefix("drafts/blog/").unwrap(), vec!["drafts/blog/1"]);
//! ```

mod ext;
mod file;

use std::collections::BTreeMap;
use std::sync::RwLock;

pub use ext::KvStoreExt;
pub use file::FileStore;

/// Error from a durable store operation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// I/O error.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key is empty or contains a control character.
    #[error("invalid store key: {0:?}")]
    InvalidKey(String),

    /// JSON serialization/deserialization error.
    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value persistence primitive.
///
/// Keys are `/`-separated strings (e.g. `"autosave/blog/content/a.md"`);
/// the separator has no meaning to the store beyond prefix listing.
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// All keys starting with `prefix`, sorted.
    fn list_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Reject keys that can't be stored safely.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.chars().any(char::is_control) {
        return Err(StoreError::InvalidKey(key.to_owned()));
    }
    Ok(())
}

/// In-memory [`KvStore`].
///
/// Values live as long as the store. Use for tests or when durability is
/// disabled.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.values.read().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.values
            .write()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.values.write().unwrap().remove(key);
        Ok(())
    }

    fn list_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .values
            .read()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
