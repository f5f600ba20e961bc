//! Autosave Buffer: unsaved edits that survive an interrupted session.
//!
//! Every edit is recorded in memory and written to the durable store once
//! the document has been quiet for the debounce window. When a document is
//! opened, a buffered copy wins over freshly fetched content. The buffer
//! for a document is cleared once its content is committed elsewhere.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quire_store::KvStore;
use tracing::{debug, warn};

use crate::debouncer::Debouncer;
use crate::error::SyncError;

/// Store key prefix of buffered documents.
const AUTOSAVE_PREFIX: &str = "autosave/";

/// Identity of an open document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    /// A remote file, by repository id and path.
    Remote {
        /// Repository id.
        repository: String,
        /// Repository-relative path.
        path: String,
    },
    /// A local draft, by draft id.
    Draft(String),
}

impl DocumentKey {
    /// Key for a remote file.
    pub fn remote(repository: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Remote {
            repository: repository.into(),
            path: path.into(),
        }
    }

    /// Key for a draft.
    pub fn draft(id: impl Into<String>) -> Self {
        Self::Draft(id.into())
    }

    fn store_key(&self) -> String {
        format!("{AUTOSAVE_PREFIX}{self}")
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote { repository, path } => write!(f, "remote/{repository}/{path}"),
            Self::Draft(id) => write!(f, "draft/{id}"),
        }
    }
}

/// Debounced per-document buffer backed by a [`KvStore`].
pub struct Autosave {
    store: Arc<dyn KvStore>,
    pending: Debouncer<DocumentKey, String>,
    /// Number of clears per key. A write overlapping a clear is undone.
    cleared: Mutex<HashMap<DocumentKey, u64>>,
    /// Held for a whole flush so two flushes never interleave.
    flushing: Mutex<()>,
}

impl Autosave {
    /// Create a buffer writing to `store` after `debounce` of quiet.
    pub fn new(store: Arc<dyn KvStore>, debounce: Duration) -> Self {
        Self {
            store,
            pending: Debouncer::new(debounce),
            cleared: Mutex::new(HashMap::new()),
            flushing: Mutex::new(()),
        }
    }

    /// Record the latest content of an open document.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn record(&self, key: DocumentKey, content: impl Into<String>) {
        self.pending.record(key, content.into());
    }

    /// Buffered content for `key`, pending or persisted.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the durable store can't be read.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn read(&self, key: &DocumentKey) -> Result<Option<String>, SyncError> {
        if let Some(content) = self.pending.peek(key) {
            return Ok(Some(content));
        }
        Ok(self.store.get(&key.store_key())?)
    }

    /// Content to show when opening a document.
    ///
    /// A buffered copy takes precedence over `fetched`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the durable store can't be read.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn open(&self, key: &DocumentKey, fetched: String) -> Result<String, SyncError> {
        match self.read(key)? {
            Some(buffered) => {
                debug!("restoring autosaved content for {key}");
                Ok(buffered)
            }
            None => Ok(fetched),
        }
    }

    /// Forget the buffer for `key`, pending and persisted.
    ///
    /// A flush already writing `key` removes its write again once it
    /// notices the clear.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the durable store can't be written.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn clear(&self, key: &DocumentKey) -> Result<(), SyncError> {
        {
            let mut cleared = self.cleared.lock().unwrap();
            *cleared.entry(key.clone()).or_default() += 1;
            self.pending.cancel(key);
        }
        self.store.remove(&key.store_key())?;
        debug!("cleared autosave for {key}");
        Ok(())
    }

    /// Persist documents whose debounce window has elapsed.
    ///
    /// Returns the number of documents written. Failed writes are kept
    /// pending and retried on the next flush, unless a newer edit or a
    /// clear arrived meanwhile.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn flush_ready(&self) -> usize {
        self.write(Debouncer::drain_ready)
    }

    /// Persist every pending document now.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn flush_all(&self) -> usize {
        self.write(Debouncer::drain_all)
    }

    fn generation(cleared: &HashMap<DocumentKey, u64>, key: &DocumentKey) -> u64 {
        cleared.get(key).copied().unwrap_or(0)
    }

    fn write(
        &self,
        drain: impl FnOnce(&Debouncer<DocumentKey, String>) -> Vec<(DocumentKey, String)>,
    ) -> usize {
        let _flushing = self.flushing.lock().unwrap();
        let (ready, generations) = {
            let cleared = self.cleared.lock().unwrap();
            (drain(&self.pending), cleared.clone())
        };

        let mut written = 0;
        for (key, content) in ready {
            let generation = Self::generation(&generations, &key);
            let result = self.store.set(&key.store_key(), &content);

            let cleared = self.cleared.lock().unwrap();
            if Self::generation(&cleared, &key) != generation {
                drop(cleared);
                debug!("autosave for {key} was cleared during the write, removing it");
                if let Err(e) = self.store.remove(&key.store_key()) {
                    warn!("failed to remove cleared autosave {key}: {e}");
                }
                continue;
            }
            match result {
                Ok(()) => written += 1,
                Err(e) => {
                    warn!("failed to autosave {key}, will retry: {e}");
                    self.pending.record_if_absent(key, content);
                }
            }
        }
        written
    }
}
