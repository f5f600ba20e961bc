//! Extension trait for [`KvStore`] with typed convenience methods.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{KvStore, StoreError};

/// Typed convenience methods for [`KvStore`].
///
/// Implemented as default methods on an extension trait so that:
///
/// - [`KvStore`] stays object-safe with no generic methods
/// - Implementors only need to handle strings
/// - Callers get typed access via a blanket impl
///
/// # Example
///
/// ```
/// use quire_store::{KvStoreExt, MemoryStore};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Draft { title: String }
///
/// let store = MemoryStore::new();
/// store.set_json("draft", &Draft { title: "Hello".into() }).unwrap();
/// let draft: Option<Draft> = store.get_json("draft").unwrap();
/// ```
pub trait KvStoreExt: KvStore {
    /// Retrieve and deserialize a JSON value.
    ///
    /// Returns `Ok(None)` if the key is absent.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize a value as JSON and store it.
    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}
