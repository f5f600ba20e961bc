//! Deadline-based debouncing of durable writes.
//!
//! Collapses bursts of records for the same key into one pending value
//! whose deadline restarts on every record. Writers drain keys whose
//! deadline has passed and persist them once.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Pending value waiting to be written.
struct Pending<V> {
    value: V,
    deadline: Instant,
}

/// Thread-safe debouncer keyed by `K`, carrying the latest `V` per key.
pub(crate) struct Debouncer<K, V = ()> {
    pending: Mutex<HashMap<K, Pending<V>>>,
    window: Duration,
}

impl<K: Eq + Hash + Clone, V: Clone> Debouncer<K, V> {
    /// Create a debouncer with the given quiet window.
    pub fn new(window: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            window,
        }
    }

    /// Record a new value for `key`, restarting its deadline.
    pub fn record(&self, key: K, value: V) {
        let deadline = Instant::now() + self.window;
        self.pending
            .lock()
            .unwrap()
            .insert(key, Pending { value, deadline });
    }

    /// Record `value` for `key` unless a value is already pending.
    ///
    /// Returns whether the value was recorded.
    pub fn record_if_absent(&self, key: K, value: V) -> bool {
        let deadline = Instant::now() + self.window;
        match self.pending.lock().unwrap().entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Pending { value, deadline });
                true
            }
        }
    }

    /// Latest pending value for `key`, if any.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.pending
            .lock()
            .unwrap()
            .get(key)
            .map(|p| p.value.clone())
    }

    /// Drop the pending value for `key` without writing it.
    pub fn cancel(&self, key: &K) {
        self.pending.lock().unwrap().remove(key);
    }

    /// Drop every pending key matching `predicate`.
    pub fn cancel_where(&self, predicate: impl Fn(&K) -> bool) {
        self.pending.lock().unwrap().retain(|k, _| !predicate(k));
    }

    /// Remove and return values whose deadline has passed.
    pub fn drain_ready(&self) -> Vec<(K, V)> {
        let mut pending = self.pending.lock().unwrap();
        let now = Instant::now();

        let ready: Vec<K> = pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();

        ready
            .into_iter()
            .filter_map(|key| pending.remove(&key).map(|p| (key, p.value)))
            .collect()
    }

    /// Remove and return every pending value, ready or not.
    pub fn drain_all(&self) -> Vec<(K, V)> {
        self.pending
            .lock()
            .unwrap()
            .drain()
            .map(|(key, p)| (key, p.value))
            .collect()
    }

    /// Number of keys waiting to be written.
    pub fn len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_single_record_ready_after_deadline() {
        let debouncer: Debouncer<&str, u32> = Debouncer::new(Duration::from_millis(10));

        debouncer.record("a", 1);
        assert!(debouncer.drain_ready().is_empty());

        thread::sleep(Duration::from_millis(15));

        assert_eq!(debouncer.drain_ready(), vec![("a", 1)]);
        assert!(debouncer.drain_ready().is_empty());
    }

    #[test]
    fn test_burst_collapses_to_latest_value() {
        let debouncer: Debouncer<&str, u32> = Debouncer::new(Duration::from_millis(10));

        debouncer.record("a", 1);
        debouncer.record("a", 2);
        debouncer.record("a", 3);

        thread::sleep(Duration::from_millis(15));

        assert_eq!(debouncer.drain_ready(), vec![("a", 3)]);
    }

    #[test]
    fn test_record_restarts_deadline() {
        let debouncer: Debouncer<&str> = Debouncer::new(Duration::from_millis(200));

        debouncer.record("a", ());
        thread::sleep(Duration::from_millis(150));
        debouncer.record("a", ());
        thread::sleep(Duration::from_millis(100));

        assert!(debouncer.drain_ready().is_empty());
        assert_eq!(debouncer.len(), 1);
    }

    #[test]
    fn test_drain_all_ignores_deadline() {
        let debouncer: Debouncer<&str, u32> = Debouncer::new(Duration::from_secs(60));

        debouncer.record("a", 1);
        debouncer.record("b", 2);

        let mut drained = debouncer.drain_all();
        drained.sort_unstable();
        assert_eq!(drained, vec![("a", 1), ("b", 2)]);
        assert_eq!(debouncer.len(), 0);
    }

    #[test]
    fn test_peek_and_cancel() {
        let debouncer: Debouncer<&str, &str> = Debouncer::new(Duration::from_secs(60));

        debouncer.record("doc", "draft text");
        assert_eq!(debouncer.peek(&"doc"), Some("draft text"));

        debouncer.cancel(&"doc");
        assert_eq!(debouncer.peek(&"doc"), None);
    }

    #[test]
    fn test_record_if_absent_keeps_newer_value() {
        let debouncer: Debouncer<&str, &str> = Debouncer::new(Duration::from_secs(60));

        assert!(debouncer.record_if_absent("doc", "old"));
        debouncer.record("doc", "new");

        assert!(!debouncer.record_if_absent("doc", "old"));
        assert_eq!(debouncer.peek(&"doc"), Some("new"));
    }

    #[test]
    fn test_cancel_where() {
        let debouncer: Debouncer<String> = Debouncer::new(Duration::from_secs(60));

        debouncer.record("blog/a".to_owned(), ());
        debouncer.record("docs/b".to_owned(), ());
        debouncer.cancel_where(|k| k.starts_with("blog/"));

        assert_eq!(debouncer.peek(&"docs/b".to_owned()), Some(()));
        assert_eq!(debouncer.len(), 1);
    }
}
