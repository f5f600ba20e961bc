//! Cache Store: the listings the presentation layer reads.
//!
//! One listing is kept per `(repository, collection)`. A listing holds the
//! entries of the directory the user is viewing (its active path) plus a
//! tombstone set masking paths deleted locally but still returned by a
//! listing fetch that has not caught up.
//!
//! Three things mutate a listing: a full [`replace`](CacheStore::replace)
//! after a fetch, an optimistic [`Patch`], or a tombstone mark. Every
//! optimistic patch returns an [`Inverse`] that undoes exactly that patch,
//! so a failed mutation restores the listing without a refetch.
//!
//! Listings are mirrored to a [`KvStore`] through a debouncer, so a burst of
//! mutations becomes one write per listing. Nothing here returns an error:
//! persistence failures are logged and retried on the next flush.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quire_remote::{Entry, listing_order, sort_entries};
use quire_store::{KvStore, KvStoreExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::debouncer::Debouncer;

/// Store key prefix of mirrored listings.
const CACHE_PREFIX: &str = "cache/";

/// Store key holding the most recently used repository id.
const ACTIVE_REPOSITORY_KEY: &str = "active-repository";

/// Which tree of a repository a listing belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Documents below the content root.
    Content,
    /// Binary files below the asset root.
    Assets,
}

impl Collection {
    /// All collections, in persistence order.
    pub const ALL: [Self; 2] = [Self::Content, Self::Assets];

    /// Lowercase name used in store keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Assets => "assets",
        }
    }
}

type ListingKey = (String, Collection);

fn store_key(repo: &str, collection: Collection) -> String {
    format!("{CACHE_PREFIX}{repo}/{}", collection.as_str())
}

/// Repository id of a mirrored listing key.
fn repository_of(key: &str) -> Option<&str> {
    let (repo, collection) = key.strip_prefix(CACHE_PREFIX)?.rsplit_once('/')?;
    Collection::ALL
        .iter()
        .any(|c| c.as_str() == collection)
        .then_some(repo)
}

/// Cached entries of one directory plus locally-deleted paths.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Listing {
    /// Directory the entries belong to; `None` until first navigation.
    #[serde(default)]
    path: Option<String>,
    /// Entries in listing order.
    entries: Vec<Entry>,
    /// Paths hidden from reads until a fetch confirms their absence.
    #[serde(default)]
    tombstones: BTreeSet<String>,
}

impl Listing {
    fn visible(&self) -> Vec<Entry> {
        self.entries
            .iter()
            .filter(|e| !self.tombstones.contains(&e.path))
            .cloned()
            .collect()
    }

    fn position(&self, path: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.path == path)
    }

    /// Entries only belong here if they live in the active directory.
    fn accepts(&self, entry: &Entry) -> bool {
        self.path.as_deref().is_none_or(|dir| entry.parent() == dir)
    }

    fn remove(&mut self, path: &str, steps: &mut Vec<Step>) {
        if let Some(index) = self.position(path) {
            let entry = self.entries.remove(index);
            steps.push(Step::Removed { index, entry });
        }
    }

    fn insert(&mut self, entry: Entry, steps: &mut Vec<Step>) {
        if !self.accepts(&entry) {
            return;
        }
        self.remove(&entry.path, steps);
        if self.tombstones.remove(&entry.path) {
            steps.push(Step::Untombstoned(entry.path.clone()));
        }
        let index = self
            .entries
            .partition_point(|e| listing_order(e, &entry) == Ordering::Less);
        steps.push(Step::Inserted(entry.path.clone()));
        self.entries.insert(index, entry);
    }

    fn update(&mut self, entry: Entry, steps: &mut Vec<Step>) {
        if let Some(index) = self.position(&entry.path) {
            let old = std::mem::replace(&mut self.entries[index], entry);
            steps.push(Step::Replaced { index, entry: old });
        }
    }

    fn undo(&mut self, step: Step) {
        match step {
            Step::Inserted(path) => {
                if let Some(index) = self.position(&path) {
                    self.entries.remove(index);
                }
            }
            Step::Removed { index, entry } => {
                let index = index.min(self.entries.len());
                self.entries.insert(index, entry);
            }
            Step::Replaced { index, entry } => {
                let index = if self.entries.get(index).is_some_and(|e| e.path == entry.path) {
                    Some(index)
                } else {
                    self.position(&entry.path)
                };
                if let Some(index) = index {
                    self.entries[index] = entry;
                }
            }
            Step::Untombstoned(path) => {
                self.tombstones.insert(path);
            }
        }
    }
}

/// Optimistic change to a listing, applied before the remote confirms it.
#[derive(Clone, Debug, PartialEq)]
pub enum Patch {
    /// Add an entry, replacing one at the same path. Ignored when the
    /// entry is outside the active directory.
    Insert(Entry),
    /// Replace an existing entry in place; no-op if absent.
    Update(Entry),
    /// Remove the entry at a path.
    Remove(String),
    /// Remove `from` and insert `to`.
    Rename {
        /// Path of the entry being renamed.
        from: String,
        /// The entry at its new location.
        to: Entry,
    },
}

/// One primitive change recorded while applying a patch.
#[derive(Debug)]
enum Step {
    Inserted(String),
    Removed { index: usize, entry: Entry },
    Replaced { index: usize, entry: Entry },
    Untombstoned(String),
}

/// Exact undo of one applied [`Patch`].
#[derive(Debug)]
#[must_use = "an inverse that is dropped can no longer roll the patch back"]
pub struct Inverse {
    key: ListingKey,
    steps: Vec<Step>,
}

impl Inverse {
    /// Returns `true` if the patch changed nothing.
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Records which directory a listing fetch was issued for.
#[derive(Debug)]
#[must_use = "complete the fetch with CacheStore::complete_fetch"]
pub struct FetchTicket {
    key: ListingKey,
    path: Option<String>,
}

impl FetchTicket {
    /// Directory the fetch was issued for.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

struct Mirror {
    store: Arc<dyn KvStore>,
    pending: Debouncer<ListingKey>,
    /// Serializes mirror writes with discards.
    writing: Mutex<()>,
}

/// In-memory listings with an optional debounced durable mirror.
pub struct CacheStore {
    listings: Mutex<HashMap<ListingKey, Listing>>,
    mirror: Option<Mirror>,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore {
    /// Create a cache with no durable mirror.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listings: Mutex::new(HashMap::new()),
            mirror: None,
        }
    }

    /// Create a cache mirrored to `store`, debouncing writes by `debounce`.
    #[must_use]
    pub fn with_store(store: Arc<dyn KvStore>, debounce: Duration) -> Self {
        Self {
            listings: Mutex::new(HashMap::new()),
            mirror: Some(Mirror {
                store,
                pending: Debouncer::new(debounce),
                writing: Mutex::new(()),
            }),
        }
    }

    /// Run `f` on a listing (created on first access) and schedule a mirror write.
    fn with_listing<R>(
        &self,
        repo: &str,
        collection: Collection,
        f: impl FnOnce(&mut Listing) -> R,
    ) -> R {
        let key = (repo.to_owned(), collection);
        let result = {
            let mut listings = self.listings.lock().unwrap();
            f(listings.entry(key.clone()).or_default())
        };
        if let Some(mirror) = &self.mirror {
            mirror.pending.record(key, ());
        }
        result
    }

    fn read<R>(
        &self,
        repo: &str,
        collection: Collection,
        f: impl FnOnce(&Listing) -> R,
    ) -> Option<R> {
        let listings = self.listings.lock().unwrap();
        listings.get(&(repo.to_owned(), collection)).map(f)
    }

    /// Current entries, minus tombstoned paths. Empty if never populated.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn get(&self, repo: &str, collection: Collection) -> Vec<Entry> {
        self.read(repo, collection, Listing::visible)
            .unwrap_or_default()
    }

    /// Cached entry at `path`, unless tombstoned.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn entry(&self, repo: &str, collection: Collection, path: &str) -> Option<Entry> {
        self.read(repo, collection, |listing| {
            listing
                .entries
                .iter()
                .find(|e| e.path == path && !listing.tombstones.contains(path))
                .cloned()
        })
        .flatten()
    }

    /// Directory the listing currently shows.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn active_path(&self, repo: &str, collection: Collection) -> Option<String> {
        self.read(repo, collection, |listing| listing.path.clone())
            .flatten()
    }

    /// Paths currently tombstoned, sorted.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn tombstones(&self, repo: &str, collection: Collection) -> Vec<String> {
        self.read(repo, collection, |listing| {
            listing.tombstones.iter().cloned().collect()
        })
        .unwrap_or_default()
    }

    /// Swap in a freshly fetched listing.
    ///
    /// Tombstones survive only for paths the fetch still returned; the rest
    /// are confirmed absent and dropped.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn replace(&self, repo: &str, collection: Collection, mut entries: Vec<Entry>) {
        sort_entries(&mut entries);
        self.with_listing(repo, collection, |listing| {
            listing
                .tombstones
                .retain(|path| entries.iter().any(|e| &e.path == path));
            listing.entries = entries;
        });
    }

    /// Apply a patch immediately and return its exact inverse.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn apply_optimistic(&self, repo: &str, collection: Collection, patch: Patch) -> Inverse {
        let mut steps = Vec::new();
        self.with_listing(repo, collection, |listing| match patch {
            Patch::Insert(entry) => listing.insert(entry, &mut steps),
            Patch::Update(entry) => listing.update(entry, &mut steps),
            Patch::Remove(path) => listing.remove(&path, &mut steps),
            Patch::Rename { from, to } => {
                listing.remove(&from, &mut steps);
                listing.insert(to, &mut steps);
            }
        });
        Inverse {
            key: (repo.to_owned(), collection),
            steps,
        }
    }

    /// Undo a patch applied by [`apply_optimistic`](Self::apply_optimistic).
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn revert(&self, inverse: Inverse) {
        if inverse.is_noop() {
            return;
        }
        let (repo, collection) = &inverse.key;
        debug!(
            "reverting {} cache step(s) for {}/{}",
            inverse.steps.len(),
            repo,
            collection.as_str()
        );
        self.with_listing(repo, *collection, |listing| {
            for step in inverse.steps.into_iter().rev() {
                listing.undo(step);
            }
        });
    }

    /// Hide `path` from reads until a fetch no longer returns it.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn mark_tombstone(&self, repo: &str, collection: Collection, path: &str) {
        self.with_listing(repo, collection, |listing| {
            listing.tombstones.insert(path.to_owned());
        });
    }

    /// Switch the listing to directory `path`.
    ///
    /// Entries of the previous directory are dropped; tombstones are kept.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn navigate(&self, repo: &str, collection: Collection, path: &str) {
        self.with_listing(repo, collection, |listing| {
            if listing.path.as_deref() != Some(path) {
                debug!("navigating {}/{} to '{}'", repo, collection.as_str(), path);
                listing.path = Some(path.to_owned());
                listing.entries.clear();
            }
        });
    }

    /// Record the active directory before issuing a listing fetch.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn begin_fetch(&self, repo: &str, collection: Collection) -> FetchTicket {
        FetchTicket {
            key: (repo.to_owned(), collection),
            path: self.active_path(repo, collection),
        }
    }

    /// Apply a fetch result, unless the user navigated elsewhere meanwhile.
    ///
    /// Returns `false` when the result was discarded as stale.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn complete_fetch(&self, ticket: FetchTicket, entries: Vec<Entry>) -> bool {
        let (repo, collection) = &ticket.key;
        let active = self.active_path(repo, *collection);
        if active != ticket.path {
            debug!(
                "discarding stale listing of {:?} for {}/{} (now at {:?})",
                ticket.path,
                repo,
                collection.as_str(),
                active
            );
            return false;
        }
        self.replace(repo, *collection, entries);
        true
    }

    /// Drop every listing of a repository, in memory and in the mirror.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn discard(&self, repo: &str) {
        let _writing = self.mirror.as_ref().map(|m| m.writing.lock().unwrap());
        self.listings
            .lock()
            .unwrap()
            .retain(|(id, _), _| id != repo);

        let Some(mirror) = &self.mirror else {
            return;
        };
        mirror.pending.cancel_where(|(id, _)| id == repo);
        for collection in Collection::ALL {
            if let Err(e) = mirror.store.remove(&store_key(repo, collection)) {
                warn!("failed to remove cached {repo}/{}: {e}", collection.as_str());
            }
        }
        match mirror.store.get(ACTIVE_REPOSITORY_KEY) {
            Ok(Some(active)) if active == repo => {
                if let Err(e) = mirror.store.remove(ACTIVE_REPOSITORY_KEY) {
                    warn!("failed to clear active repository: {e}");
                }
            }
            Ok(_) => {}
            Err(e) => warn!("failed to read active repository: {e}"),
        }
        debug!("discarded cache for repository {repo}");
    }

    /// Discard every cached repository whose id is not in `keep`.
    ///
    /// Looks at listings in memory, listings in the mirror and the stored
    /// active repository. Returns the discarded ids, sorted.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn retain_repositories(&self, keep: &[&str]) -> Vec<String> {
        let mut cached: BTreeSet<String> = self
            .listings
            .lock()
            .unwrap()
            .keys()
            .map(|(id, _)| id.clone())
            .collect();
        if let Some(mirror) = &self.mirror {
            match mirror.store.list_keys_with_prefix(CACHE_PREFIX) {
                Ok(keys) => {
                    cached.extend(keys.iter().filter_map(|k| repository_of(k)).map(str::to_owned));
                }
                Err(e) => warn!("failed to list cached repositories: {e}"),
            }
            match mirror.store.get(ACTIVE_REPOSITORY_KEY) {
                Ok(Some(active)) => {
                    cached.insert(active);
                }
                Ok(None) => {}
                Err(e) => warn!("failed to read active repository: {e}"),
            }
        }

        let removed: Vec<String> = cached
            .into_iter()
            .filter(|id| !keep.contains(&id.as_str()))
            .collect();
        for repo in &removed {
            self.discard(repo);
        }
        removed
    }

    /// Seed listings of `repo` from the mirror.
    ///
    /// Listings already in memory are left alone. Returns the number of
    /// listings loaded.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn load(&self, repo: &str) -> usize {
        let Some(mirror) = &self.mirror else {
            return 0;
        };
        let mut loaded = 0;
        for collection in Collection::ALL {
            let key = (repo.to_owned(), collection);
            if self.listings.lock().unwrap().contains_key(&key) {
                continue;
            }
            match mirror.store.get_json::<Listing>(&store_key(repo, collection)) {
                Ok(Some(listing)) => {
                    self.listings
                        .lock()
                        .unwrap()
                        .entry(key)
                        .or_insert(listing);
                    loaded += 1;
                }
                Ok(None) => {}
                Err(e) => warn!("ignoring unreadable cache for {repo}/{}: {e}", collection.as_str()),
            }
        }
        debug!("loaded {loaded} cached listing(s) for {repo}");
        loaded
    }

    /// Remember `repo` as the repository to restore on the next start.
    pub fn set_active_repository(&self, repo: &str) {
        if let Some(mirror) = &self.mirror
            && let Err(e) = mirror.store.set(ACTIVE_REPOSITORY_KEY, repo)
        {
            warn!("failed to persist active repository: {e}");
        }
    }

    /// Load the listings of the previously active repository.
    ///
    /// Returns its id, or `None` on a first start.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn restore_active(&self) -> Option<String> {
        let mirror = self.mirror.as_ref()?;
        let repo = match mirror.store.get(ACTIVE_REPOSITORY_KEY) {
            Ok(repo) => repo?,
            Err(e) => {
                warn!("failed to read active repository: {e}");
                return None;
            }
        };
        self.load(&repo);
        Some(repo)
    }

    /// Write listings whose debounce window has elapsed.
    ///
    /// Returns the number of listings written.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn flush_ready(&self) -> usize {
        match &self.mirror {
            Some(mirror) => self.write(mirror, mirror.pending.drain_ready()),
            None => 0,
        }
    }

    /// Write every pending listing now.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn flush_all(&self) -> usize {
        match &self.mirror {
            Some(mirror) => self.write(mirror, mirror.pending.drain_all()),
            None => 0,
        }
    }

    fn write(&self, mirror: &Mirror, keys: Vec<(ListingKey, ())>) -> usize {
        let _writing = mirror.writing.lock().unwrap();
        let mut written = 0;
        for (key, ()) in keys {
            let snapshot = self.listings.lock().unwrap().get(&key).cloned();
            let store_key = store_key(&key.0, key.1);
            let result = match &snapshot {
                Some(listing) => mirror.store.set_json(&store_key, listing),
                None => mirror.store.remove(&store_key),
            };
            match result {
                Ok(()) => written += 1,
                Err(e) => {
                    warn!("failed to mirror {store_key}, will retry: {e}");
                    mirror.pending.record(key, ());
                }
            }
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quire_store::MemoryStore;

    use super::*;

    const REPO: &str = "blog";

    fn file(path: &str) -> Entry {
        Entry::file(path, format!("tok-{path}"))
    }

    fn seeded() -> CacheStore {
        let cache = CacheStore::new();
        cache.navigate(REPO, Collection::Content, "content");
        cache.replace(
            REPO,
            Collection::Content,
            vec![
                file("content/b.md"),
                Entry::directory("content/posts"),
                file("content/a.md"),
            ],
        );
        cache
    }

    fn paths(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_get_never_populated_is_empty() {
        let cache = CacheStore::new();

        assert!(cache.get(REPO, Collection::Assets).is_empty());
    }

    #[test]
    fn test_replace_sorts_directories_first() {
        let cache = seeded();

        assert_eq!(
            paths(&cache.get(REPO, Collection::Content)),
            vec!["content/posts", "content/a.md", "content/b.md"]
        );
    }

    #[test]
    fn test_tombstone_masks_stale_listing() {
        let cache = seeded();

        cache.mark_tombstone(REPO, Collection::Content, "content/a.md");
        cache.replace(
            REPO,
            Collection::Content,
            vec![file("content/a.md"), file("content/b.md")],
        );

        assert_eq!(paths(&cache.get(REPO, Collection::Content)), vec!["content/b.md"]);
        assert_eq!(cache.tombstones(REPO, Collection::Content), vec!["content/a.md"]);
    }

    #[test]
    fn test_replace_clears_confirmed_tombstones() {
        let cache = seeded();

        cache.mark_tombstone(REPO, Collection::Content, "content/a.md");
        cache.replace(REPO, Collection::Content, vec![file("content/b.md")]);

        assert!(cache.tombstones(REPO, Collection::Content).is_empty());
    }

    #[test]
    fn test_insert_lands_in_listing_order() {
        let cache = seeded();

        let _ = cache.apply_optimistic(REPO, Collection::Content, Patch::Insert(file("content/aa.md")));

        assert_eq!(
            paths(&cache.get(REPO, Collection::Content)),
            vec!["content/posts", "content/a.md", "content/aa.md", "content/b.md"]
        );
    }

    #[test]
    fn test_insert_outside_active_directory_is_ignored() {
        let cache = seeded();

        let inverse = cache.apply_optimistic(
            REPO,
            Collection::Content,
            Patch::Insert(file("content/posts/x.md")),
        );

        assert!(inverse.is_noop());
        assert_eq!(cache.get(REPO, Collection::Content).len(), 3);
    }

    #[test]
    fn test_insert_clears_tombstone_and_revert_restores_it() {
        let cache = seeded();
        cache.mark_tombstone(REPO, Collection::Content, "content/a.md");

        let inverse = cache.apply_optimistic(
            REPO,
            Collection::Content,
            Patch::Insert(file("content/a.md")),
        );
        assert!(cache.entry(REPO, Collection::Content, "content/a.md").is_some());

        cache.revert(inverse);
        assert_eq!(cache.tombstones(REPO, Collection::Content), vec!["content/a.md"]);
        assert!(cache.entry(REPO, Collection::Content, "content/a.md").is_none());
    }

    #[test]
    fn test_rename_revert_is_exact() {
        let cache = seeded();
        let before = cache.get(REPO, Collection::Content);

        let inverse = cache.apply_optimistic(
            REPO,
            Collection::Content,
            Patch::Rename {
                from: "content/a.md".to_owned(),
                to: file("content/a.md").relocated("content/z.md"),
            },
        );
        assert_eq!(
            paths(&cache.get(REPO, Collection::Content)),
            vec!["content/posts", "content/b.md", "content/z.md"]
        );

        cache.revert(inverse);
        assert_eq!(cache.get(REPO, Collection::Content), before);
    }

    #[test]
    fn test_update_revert_restores_old_entry() {
        let cache = seeded();
        let before = cache.get(REPO, Collection::Content);

        let mut updated = file("content/b.md");
        updated.version_token = Some("new".to_owned());
        let inverse = cache.apply_optimistic(REPO, Collection::Content, Patch::Update(updated));
        assert_eq!(
            cache
                .entry(REPO, Collection::Content, "content/b.md")
                .unwrap()
                .version_token
                .as_deref(),
            Some("new")
        );

        cache.revert(inverse);
        assert_eq!(cache.get(REPO, Collection::Content), before);
    }

    #[test]
    fn test_update_missing_is_noop() {
        let cache = seeded();

        let inverse = cache.apply_optimistic(
            REPO,
            Collection::Content,
            Patch::Update(file("content/missing.md")),
        );

        assert!(inverse.is_noop());
    }

    #[test]
    fn test_remove_revert_restores_position() {
        let cache = seeded();
        let before = cache.get(REPO, Collection::Content);

        let inverse = cache.apply_optimistic(
            REPO,
            Collection::Content,
            Patch::Remove("content/a.md".to_owned()),
        );
        cache.revert(inverse);

        assert_eq!(cache.get(REPO, Collection::Content), before);
    }

    #[test]
    fn test_navigate_clears_entries() {
        let cache = seeded();

        cache.navigate(REPO, Collection::Content, "content/posts");

        assert!(cache.get(REPO, Collection::Content).is_empty());
        assert_eq!(
            cache.active_path(REPO, Collection::Content).as_deref(),
            Some("content/posts")
        );
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let cache = CacheStore::new();
        cache.navigate(REPO, Collection::Content, "content/a");
        let ticket = cache.begin_fetch(REPO, Collection::Content);

        cache.navigate(REPO, Collection::Content, "content/b");
        cache.replace(REPO, Collection::Content, vec![file("content/b/x.md")]);
        let applied = cache.complete_fetch(ticket, vec![file("content/a/late.md")]);

        assert!(!applied);
        assert_eq!(
            paths(&cache.get(REPO, Collection::Content)),
            vec!["content/b/x.md"]
        );
    }

    #[test]
    fn test_revisited_path_accepts_late_response() {
        let cache = CacheStore::new();
        cache.navigate(REPO, Collection::Content, "content/a");
        let ticket = cache.begin_fetch(REPO, Collection::Content);

        cache.navigate(REPO, Collection::Content, "content/b");
        cache.navigate(REPO, Collection::Content, "content/a");

        assert!(cache.complete_fetch(ticket, vec![file("content/a/x.md")]));
        assert_eq!(
            paths(&cache.get(REPO, Collection::Content)),
            vec!["content/a/x.md"]
        );
    }

    #[test]
    fn test_collections_are_independent() {
        let cache = seeded();

        cache.replace(REPO, Collection::Assets, vec![file("images/cat.png")]);

        assert_eq!(cache.get(REPO, Collection::Content).len(), 3);
        assert_eq!(cache.get(REPO, Collection::Assets).len(), 1);
        assert!(cache.get("docs", Collection::Content).is_empty());
    }

    fn mirrored(store: &Arc<MemoryStore>) -> CacheStore {
        let store: Arc<dyn KvStore> = Arc::clone(store) as Arc<dyn KvStore>;
        CacheStore::with_store(store, Duration::from_secs(60))
    }

    #[test]
    fn test_mirror_collapses_burst_into_one_write() {
        let store = Arc::new(MemoryStore::new());
        let cache = mirrored(&store);

        cache.navigate(REPO, Collection::Content, "content");
        cache.replace(REPO, Collection::Content, vec![file("content/a.md")]);
        cache.mark_tombstone(REPO, Collection::Content, "content/a.md");

        assert_eq!(cache.flush_ready(), 0);
        assert_eq!(cache.flush_all(), 1);
        assert_eq!(
            store.list_keys_with_prefix(CACHE_PREFIX).unwrap(),
            vec!["cache/blog/content"]
        );
    }

    #[test]
    fn test_restore_active_seeds_cache_on_cold_start() {
        let store = Arc::new(MemoryStore::new());
        {
            let cache = mirrored(&store);
            cache.set_active_repository(REPO);
            cache.navigate(REPO, Collection::Content, "content");
            cache.replace(
                REPO,
                Collection::Content,
                vec![file("content/b.md"), file("content/a.md")],
            );
            cache.flush_all();
        }

        let cache = mirrored(&store);
        let restored = cache.restore_active();

        assert_eq!(restored.as_deref(), Some(REPO));
        assert_eq!(
            paths(&cache.get(REPO, Collection::Content)),
            vec!["content/a.md", "content/b.md"]
        );
        assert_eq!(
            cache.active_path(REPO, Collection::Content).as_deref(),
            Some("content")
        );
    }

    #[test]
    fn test_restore_active_first_start() {
        let store = Arc::new(MemoryStore::new());
        let cache = mirrored(&store);

        assert_eq!(cache.restore_active(), None);
    }

    #[test]
    fn test_discard_removes_memory_and_mirror() {
        let store = Arc::new(MemoryStore::new());
        let cache = mirrored(&store);
        cache.set_active_repository(REPO);
        cache.replace(REPO, Collection::Content, vec![file("content/a.md")]);
        cache.replace("docs", Collection::Content, vec![file("docs/a.md")]);
        cache.flush_all();

        cache.replace(REPO, Collection::Assets, vec![file("images/x.png")]);
        cache.discard(REPO);

        assert!(cache.get(REPO, Collection::Content).is_empty());
        assert_eq!(cache.flush_all(), 0);
        assert_eq!(
            store.list_keys_with_prefix(CACHE_PREFIX).unwrap(),
            vec!["cache/docs/content"]
        );
        assert_eq!(store.get(ACTIVE_REPOSITORY_KEY).unwrap(), None);
    }

    #[test]
    fn test_retain_repositories_discards_every_removed_repository() {
        let store = Arc::new(MemoryStore::new());
        {
            let cache = mirrored(&store);
            cache.replace("blog", Collection::Content, vec![file("content/a.md")]);
            cache.replace("old", Collection::Assets, vec![file("static/x.png")]);
            cache.replace("docs", Collection::Content, vec![file("docs/a.md")]);
            cache.set_active_repository("docs");
            cache.flush_all();
        }

        let cache = mirrored(&store);
        let removed = cache.retain_repositories(&["docs"]);

        assert_eq!(removed, vec!["blog", "old"]);
        assert_eq!(
            store.list_keys_with_prefix(CACHE_PREFIX).unwrap(),
            vec!["cache/docs/content"]
        );
        assert_eq!(store.get(ACTIVE_REPOSITORY_KEY).unwrap().as_deref(), Some("docs"));
    }

    #[test]
    fn test_retain_repositories_clears_removed_active_repository() {
        let store = Arc::new(MemoryStore::new());
        let cache = mirrored(&store);
        cache.set_active_repository("gone");

        assert_eq!(cache.retain_repositories(&["blog"]), vec!["gone"]);
        assert_eq!(store.get(ACTIVE_REPOSITORY_KEY).unwrap(), None);
        assert_eq!(cache.restore_active(), None);
    }

    #[test]
    fn test_discard_during_flush_is_not_undone() {
        use std::thread;

        use crate::testing::GatedStore;

        let (store, entered, resume) = GatedStore::new(false);
        let cache = Arc::new(CacheStore::with_store(
            Arc::clone(&store) as Arc<dyn KvStore>,
            Duration::from_secs(60),
        ));
        cache.replace(REPO, Collection::Content, vec![file("content/a.md")]);

        let flushing = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.flush_all())
        };
        entered.recv().unwrap();
        let discarding = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.discard(REPO))
        };
        thread::sleep(Duration::from_millis(20));
        resume.send(()).unwrap();

        flushing.join().unwrap();
        discarding.join().unwrap();
        assert!(store.inner.list_keys_with_prefix(CACHE_PREFIX).unwrap().is_empty());
        assert!(cache.get(REPO, Collection::Content).is_empty());
    }
}
