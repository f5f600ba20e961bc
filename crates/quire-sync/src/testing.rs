//! Test helpers shared by the persistence tests.

use std::sync::{Arc, Mutex, mpsc};

use quire_store::{KvStore, MemoryStore, StoreError};

/// Store whose `set` pauses until the test lets it continue.
pub(crate) struct GatedStore {
    pub(crate) inner: MemoryStore,
    fail: bool,
    entered: Mutex<mpsc::Sender<()>>,
    resume: Mutex<mpsc::Receiver<()>>,
}

impl GatedStore {
    pub(crate) fn new(fail: bool) -> (Arc<Self>, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel();
        let store = Arc::new(Self {
            inner: MemoryStore::new(),
            fail,
            entered: Mutex::new(entered_tx),
            resume: Mutex::new(resume_rx),
        });
        (store, entered_rx, resume_tx)
    }
}

impl KvStore for GatedStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entered.lock().unwrap().send(()).unwrap();
        self.resume.lock().unwrap().recv().unwrap();
        if self.fail {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }

    fn list_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.inner.list_keys_with_prefix(prefix)
    }
}
