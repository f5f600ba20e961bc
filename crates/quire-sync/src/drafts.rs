//! Draft Manager: local documents not yet published to the remote.
//!
//! Drafts live in the durable store under `drafts/{id}`, independent of any
//! remote tree. Publishing writes the draft to a path derived from its title
//! and removes it only once the remote write has succeeded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use quire_remote::Entry;
use quire_store::{KvStore, KvStoreExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::autosave::{Autosave, DocumentKey};
use crate::coordinator::Coordinator;
use crate::error::SyncError;
use crate::paths::resolve_content_path;

const DRAFT_PREFIX: &str = "drafts/";

/// A locally authored document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    /// Locally generated id, stable for the draft's lifetime.
    pub id: String,
    /// Human title, also the source of the published file name.
    pub title: String,
    /// Markdown body.
    pub content: String,
    /// Repository the draft is published to.
    pub repository_id: String,
    /// Content-root-relative directory chosen at creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_directory: Option<String>,
    /// Time of the last local save.
    pub last_modified: DateTime<Utc>,
}

/// Turn a title into a file stem.
///
/// Lower-cases, collapses every run of non-alphanumeric characters into a
/// single `-` and trims leading and trailing separators.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }
    slug
}

/// Draft storage and publishing.
pub struct Drafts {
    store: Arc<dyn KvStore>,
    autosave: Option<Arc<Autosave>>,
}

impl Drafts {
    /// Create a manager over `store`.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            autosave: None,
        }
    }

    /// Attach an autosave buffer, cleared when a draft is deleted or published.
    #[must_use]
    pub fn with_autosave(mut self, autosave: Arc<Autosave>) -> Self {
        self.autosave = Some(autosave);
        self
    }

    fn key(id: &str) -> String {
        format!("{DRAFT_PREFIX}{id}")
    }

    /// Create and store an empty draft.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the draft can't be written.
    pub fn create(
        &self,
        repository_id: &str,
        title: &str,
        target_directory: Option<&str>,
    ) -> Result<Draft, SyncError> {
        let draft = Draft {
            id: Uuid::new_v4().to_string(),
            title: title.to_owned(),
            content: String::new(),
            repository_id: repository_id.to_owned(),
            target_directory: target_directory
                .filter(|dir| !dir.is_empty())
                .map(str::to_owned),
            last_modified: Utc::now(),
        };
        self.store.set_json(&Self::key(&draft.id), &draft)?;
        info!("created draft {} ({})", draft.id, draft.title);
        Ok(draft)
    }

    /// Store `draft`, bumping its modification time.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the draft can't be written.
    pub fn save(&self, draft: &Draft) -> Result<Draft, SyncError> {
        let mut saved = draft.clone();
        saved.last_modified = Utc::now();
        self.store.set_json(&Self::key(&saved.id), &saved)?;
        Ok(saved)
    }

    /// Change a draft's title.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::DraftNotFound`] for an unknown id.
    pub fn rename(&self, id: &str, title: &str) -> Result<Draft, SyncError> {
        let mut draft = self.get(id)?;
        draft.title = title.to_owned();
        self.save(&draft)
    }

    /// Load a draft.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::DraftNotFound`] for an unknown id.
    pub fn get(&self, id: &str) -> Result<Draft, SyncError> {
        self.store
            .get_json(&Self::key(id))?
            .ok_or_else(|| SyncError::DraftNotFound(id.to_owned()))
    }

    /// Content to show when opening a draft, preferring its autosaved copy.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::DraftNotFound`] for an unknown id.
    pub fn open(&self, id: &str) -> Result<String, SyncError> {
        let draft = self.get(id)?;
        match &self.autosave {
            Some(autosave) => autosave.open(&DocumentKey::draft(id), draft.content),
            None => Ok(draft.content),
        }
    }

    /// Delete a draft and its autosave buffer. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the store can't be written.
    pub fn delete(&self, id: &str) -> Result<(), SyncError> {
        self.store.remove(&Self::key(id))?;
        if let Some(autosave) = &self.autosave {
            autosave.clear(&DocumentKey::draft(id))?;
        }
        info!("deleted draft {id}");
        Ok(())
    }

    /// Drafts of a repository, most recently modified first.
    ///
    /// Entries that fail to parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the store can't be read.
    pub fn list(&self, repository_id: &str) -> Result<Vec<Draft>, SyncError> {
        let mut drafts = Vec::new();
        for key in self.store.list_keys_with_prefix(DRAFT_PREFIX)? {
            match self.store.get_json::<Draft>(&key) {
                Ok(Some(draft)) if draft.repository_id == repository_id => drafts.push(draft),
                Ok(_) => {}
                Err(e) => warn!("skipping unreadable draft {key}: {e}"),
            }
        }
        drafts.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(drafts)
    }

    /// Repository path a draft publishes to.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] if the title has no alphanumerics.
    pub fn destination(draft: &Draft, coordinator: &Coordinator) -> Result<String, SyncError> {
        let slug = slugify(&draft.title);
        if slug.is_empty() {
            return Err(SyncError::validation(format!(
                "draft title '{}' yields an empty file name",
                draft.title
            )));
        }
        let layout = coordinator.layout();
        resolve_content_path(
            layout,
            draft.target_directory.as_deref().unwrap_or_default(),
            &format!("{slug}.{}", layout.draft_extension),
        )
    }

    /// Publish a draft as a remote file, then delete it.
    ///
    /// An existing file at the destination is updated rather than
    /// conflicting. On failure the draft is kept unchanged.
    ///
    /// # Errors
    ///
    /// - [`SyncError::DraftNotFound`] for an unknown id
    /// - [`SyncError::Validation`] if the draft targets another repository
    ///   or its title yields no file name
    /// - the remote error of the write
    pub fn publish(
        &self,
        id: &str,
        message: &str,
        coordinator: &Coordinator,
    ) -> Result<Entry, SyncError> {
        let draft = self.get(id)?;
        if draft.repository_id != coordinator.repository() {
            return Err(SyncError::validation(format!(
                "draft {id} belongs to repository '{}', not '{}'",
                draft.repository_id,
                coordinator.repository()
            )));
        }
        let path = Self::destination(&draft, coordinator)?;
        let content = match &self.autosave {
            Some(autosave) => autosave
                .read(&DocumentKey::draft(id))?
                .unwrap_or(draft.content),
            None => draft.content,
        };

        let entry = coordinator
            .upsert_file(&path, content.as_bytes(), message)
            .inspect_err(|e| warn!("publishing draft {id} failed, keeping it: {e}"))?;

        self.delete(id)?;
        info!("published draft {id} to {}", entry.path);
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use quire_config::{RepositoryConfig, SiteLayout};
    use quire_remote::{MockOp, MockRemote, RemoteContent, RemoteErrorKind};
    use quire_store::{FileStore, MemoryStore};
    use tempfile::TempDir;

    use super::*;
    use crate::cache::CacheStore;
    use crate::error::ErrorKind;

    fn coordinator(remote: &Arc<MockRemote>) -> Coordinator {
        let config = RepositoryConfig {
            id: "blog".to_owned(),
            owner: "acme".to_owned(),
            repo: "site".to_owned(),
            branch: "main".to_owned(),
            layout: SiteLayout::default(),
        };
        Coordinator::new(
            &config,
            Arc::clone(remote) as Arc<dyn RemoteContent>,
            Arc::new(CacheStore::new()),
        )
    }

    fn drafts() -> Drafts {
        Drafts::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  --Rust 2024 -- Notes--  "), "rust-2024-notes");
        assert_eq!(slugify("Ünïcode Títle"), "ünïcode-títle");
        assert_eq!(slugify("?!"), "");
    }

    #[test]
    fn test_create_get_rename() {
        let drafts = drafts();
        let draft = drafts.create("blog", "First", Some("posts")).unwrap();

        let renamed = drafts.rename(&draft.id, "Second").unwrap();

        assert_eq!(renamed.title, "Second");
        assert!(renamed.last_modified >= draft.last_modified);
        assert_eq!(drafts.get(&draft.id).unwrap(), renamed);
        assert_eq!(renamed.target_directory.as_deref(), Some("posts"));
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let err = drafts().get("missing").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_list_filters_by_repository_newest_first() {
        let drafts = drafts();
        let older = drafts.create("blog", "Older", None).unwrap();
        drafts.create("docs", "Elsewhere", None).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        let mut newer = drafts.create("blog", "Newer", None).unwrap();
        newer.content = "text".to_owned();
        let newer = drafts.save(&newer).unwrap();

        let listed = drafts.list("blog").unwrap();

        assert_eq!(listed, vec![newer, older]);
    }

    #[test]
    fn test_drafts_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        let id = {
            let store = FileStore::open(tmp.path().to_path_buf(), "1").unwrap();
            Drafts::new(Arc::new(store))
                .create("blog", "Kept", None)
                .unwrap()
                .id
        };

        let store = FileStore::open(tmp.path().to_path_buf(), "1").unwrap();
        let reopened = Drafts::new(Arc::new(store));

        assert_eq!(reopened.get(&id).unwrap().title, "Kept");
    }

    #[test]
    fn test_delete_clears_autosave() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let autosave = Arc::new(Autosave::new(Arc::clone(&store), Duration::from_secs(60)));
        let drafts = Drafts::new(store).with_autosave(Arc::clone(&autosave));
        let draft = drafts.create("blog", "Gone", None).unwrap();
        autosave.record(DocumentKey::draft(&draft.id), "typing");
        autosave.flush_all();

        drafts.delete(&draft.id).unwrap();

        assert!(drafts.list("blog").unwrap().is_empty());
        assert_eq!(autosave.read(&DocumentKey::draft(&draft.id)).unwrap(), None);
    }

    #[test]
    fn test_open_prefers_autosave() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let autosave = Arc::new(Autosave::new(Arc::clone(&store), Duration::from_secs(60)));
        let drafts = Drafts::new(store).with_autosave(Arc::clone(&autosave));
        let mut draft = drafts.create("blog", "Open", None).unwrap();
        draft.content = "saved".to_owned();
        drafts.save(&draft).unwrap();

        assert_eq!(drafts.open(&draft.id).unwrap(), "saved");
        autosave.record(DocumentKey::draft(&draft.id), "unsaved");
        assert_eq!(drafts.open(&draft.id).unwrap(), "unsaved");
    }

    #[test]
    fn test_publish_creates_file_and_deletes_draft() {
        let remote = Arc::new(MockRemote::new());
        let coordinator = coordinator(&remote);
        let drafts = drafts();
        let mut draft = drafts.create("blog", "Hello World", Some("posts")).unwrap();
        draft.content = "# Hello".to_owned();
        drafts.save(&draft).unwrap();

        let entry = drafts.publish(&draft.id, "Publish", &coordinator).unwrap();

        assert_eq!(entry.path, "content/posts/hello-world.md");
        assert_eq!(remote.file("content/posts/hello-world.md").unwrap(), b"# Hello");
        assert_eq!(drafts.get(&draft.id).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_publish_over_existing_file_updates() {
        let remote = Arc::new(MockRemote::new().with_file("content/hello.md", "old post"));
        let coordinator = coordinator(&remote);
        let drafts = drafts();
        let mut draft = drafts.create("blog", "Hello", None).unwrap();
        draft.content = "new post".to_owned();
        drafts.save(&draft).unwrap();

        drafts.publish(&draft.id, "Publish", &coordinator).unwrap();

        assert_eq!(remote.file("content/hello.md").unwrap(), b"new post");
    }

    #[test]
    fn test_failed_publish_keeps_draft() {
        let remote = Arc::new(MockRemote::new());
        let coordinator = coordinator(&remote);
        let drafts = drafts();
        let mut draft = drafts.create("blog", "Hello", None).unwrap();
        draft.content = "precious".to_owned();
        let draft = drafts.save(&draft).unwrap();
        remote.fail_next(MockOp::PutFile, RemoteErrorKind::Network);

        let err = drafts.publish(&draft.id, "Publish", &coordinator).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert_eq!(drafts.get(&draft.id).unwrap(), draft);
        assert!(!remote.exists("content/hello.md"));
    }

    #[test]
    fn test_publish_lookup_failure_keeps_draft() {
        let remote = Arc::new(MockRemote::new());
        let coordinator = coordinator(&remote);
        let drafts = drafts();
        let draft = drafts.create("blog", "Hello", None).unwrap();
        remote.fail_next(MockOp::GetFile, RemoteErrorKind::Unauthenticated);

        let err = drafts.publish(&draft.id, "Publish", &coordinator).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        assert!(remote.calls_of(MockOp::PutFile).is_empty());
        assert!(drafts.get(&draft.id).is_ok());
    }

    #[test]
    fn test_publish_uses_autosaved_content() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let autosave = Arc::new(Autosave::new(Arc::clone(&store), Duration::from_secs(60)));
        let drafts = Drafts::new(store).with_autosave(Arc::clone(&autosave));
        let remote = Arc::new(MockRemote::new());
        let coordinator = coordinator(&remote);
        let draft = drafts.create("blog", "Buffered", None).unwrap();
        autosave.record(DocumentKey::draft(&draft.id), "latest edit");

        drafts.publish(&draft.id, "Publish", &coordinator).unwrap();

        assert_eq!(remote.file("content/buffered.md").unwrap(), b"latest edit");
        assert_eq!(autosave.read(&DocumentKey::draft(&draft.id)).unwrap(), None);
    }

    #[test]
    fn test_publish_rejects_empty_slug_and_other_repository() {
        let remote = Arc::new(MockRemote::new());
        let coordinator = coordinator(&remote);
        let drafts = drafts();
        let symbols = drafts.create("blog", "!!!", None).unwrap();
        let foreign = drafts.create("docs", "Hello", None).unwrap();

        for id in [&symbols.id, &foreign.id] {
            let err = drafts.publish(id, "Publish", &coordinator).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValidationError);
        }
        assert!(remote.calls().is_empty());
    }
}
