//! Mutation Coordinator: user-level file operations over a per-file remote.
//!
//! Each operation is an ordered sequence of Remote Content API calls. The
//! Cache Store is patched before the first call, and the exact patch is
//! reverted if the sequence fails before anything was committed. Sequences
//! that fail after committing some calls return
//! [`SyncError::PartialFailure`] and keep the cache closest to the user's
//! intent.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use quire_config::{RepositoryConfig, SiteLayout};
use quire_remote::{
    Entry, FileContent, RemoteContent, RemoteError, is_within, join_path, parent_path,
    sort_entries,
};
use tracing::{debug, info, warn};

use crate::autosave::{Autosave, DocumentKey};
use crate::cache::{CacheStore, Collection, Inverse, Patch};
use crate::error::{PartialFailure, SyncError};
use crate::paths::{
    asset_root, content_root, relative_to_asset_root, resolve_asset_path, resolve_content_path,
    validate_name,
};
use crate::tree::{TreeRewriter, moved_path};

/// A text document opened for editing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenDocument {
    /// Repository path.
    pub path: String,
    /// Text to show: the autosaved copy if one exists, otherwise the remote content.
    pub text: String,
    /// Token to pass to [`Coordinator::save_file`].
    pub version_token: String,
    /// Whether `text` came from the autosave buffer.
    pub restored: bool,
}

/// File entry whose version token is not known yet.
fn pending_file(path: &str) -> Entry {
    Entry {
        version_token: None,
        ..Entry::file(path, String::new())
    }
}

fn partial(
    operation: &'static str,
    completed: Vec<String>,
    failed: impl Into<String>,
    source: RemoteError,
) -> SyncError {
    let failed = failed.into();
    warn!(
        "{operation} stopped at '{failed}' after committing {}",
        completed.join(", ")
    );
    PartialFailure {
        operation,
        completed,
        failed,
        source,
    }
    .into()
}

/// Executes user-level mutations for one repository.
pub struct Coordinator {
    repository: String,
    layout: SiteLayout,
    remote: Arc<dyn RemoteContent>,
    cache: Arc<CacheStore>,
    autosave: Option<Arc<Autosave>>,
}

impl Coordinator {
    /// Create a coordinator for `repository`.
    pub fn new(
        repository: &RepositoryConfig,
        remote: Arc<dyn RemoteContent>,
        cache: Arc<CacheStore>,
    ) -> Self {
        Self {
            repository: repository.id.clone(),
            layout: repository.layout.clone(),
            remote,
            cache,
            autosave: None,
        }
    }

    /// Attach an autosave buffer, cleared whenever a document is committed.
    #[must_use]
    pub fn with_autosave(mut self, autosave: Arc<Autosave>) -> Self {
        self.autosave = Some(autosave);
        self
    }

    /// Repository id.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Site layout of the repository.
    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    /// The shared cache.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    fn collection_of(&self, path: &str) -> Collection {
        match asset_root(&self.layout) {
            Ok(root) if is_within(path, &root) => Collection::Assets,
            _ => Collection::Content,
        }
    }

    fn is_placeholder(&self, entry: &Entry) -> bool {
        !entry.is_dir() && entry.name == self.layout.placeholder
    }

    /// Roots are never pruned or deleted as directories.
    fn is_root(&self, dir: &str) -> bool {
        dir.is_empty()
            || content_root(&self.layout).is_ok_and(|root| root == dir)
            || asset_root(&self.layout).is_ok_and(|root| root == dir)
    }

    fn patch(&self, path: &str, patch: Patch) -> Inverse {
        self.cache
            .apply_optimistic(&self.repository, self.collection_of(path), patch)
    }

    fn tombstone(&self, path: &str) {
        let collection = self.collection_of(path);
        self.cache.mark_tombstone(&self.repository, collection, path);
        let _ = self
            .cache
            .apply_optimistic(&self.repository, collection, Patch::Remove(path.to_owned()));
    }

    /// Patch the cache for an entry moving from `from` to `to`.
    fn relocate_in_cache(&self, from: &str, to: Entry) -> Vec<Inverse> {
        let source = self.collection_of(from);
        let target = self.collection_of(&to.path);
        if source == target {
            vec![self.cache.apply_optimistic(
                &self.repository,
                source,
                Patch::Rename {
                    from: from.to_owned(),
                    to,
                },
            )]
        } else {
            vec![
                self.cache.apply_optimistic(
                    &self.repository,
                    source,
                    Patch::Remove(from.to_owned()),
                ),
                self.cache
                    .apply_optimistic(&self.repository, target, Patch::Insert(to)),
            ]
        }
    }

    fn revert_all(&self, inverses: Vec<Inverse>) {
        for inverse in inverses.into_iter().rev() {
            self.cache.revert(inverse);
        }
    }

    fn clear_autosave(&self, path: &str) {
        if let Some(autosave) = &self.autosave
            && let Err(e) = autosave.clear(&DocumentKey::remote(&self.repository, path))
        {
            warn!("failed to clear autosave for {path}: {e}");
        }
    }

    // Listing

    /// Fetch directory `dir` (a repository path) and make it the active listing.
    ///
    /// Placeholder files are hidden. If the user navigated elsewhere while
    /// the fetch was in flight, the result is discarded and the listing of
    /// the new directory is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the remote error; the cache keeps its previous entries.
    pub fn list(&self, dir: &str) -> Result<Vec<Entry>, SyncError> {
        self.fetch_listing(Collection::Content, dir)
    }

    /// Fetch the asset root listing. A missing asset root lists as empty.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] for a malformed layout, or the
    /// remote error.
    pub fn list_assets(&self) -> Result<Vec<Entry>, SyncError> {
        let root = asset_root(&self.layout)?;
        self.fetch_listing(Collection::Assets, &root)
    }

    fn fetch_listing(&self, collection: Collection, dir: &str) -> Result<Vec<Entry>, SyncError> {
        self.cache.navigate(&self.repository, collection, dir);
        let ticket = self.cache.begin_fetch(&self.repository, collection);

        let entries = match self.remote.list_directory(dir) {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() && collection == Collection::Assets => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        let entries: Vec<Entry> = entries
            .into_iter()
            .filter(|e| !self.is_placeholder(e))
            .filter(|e| collection == Collection::Content || !e.is_dir())
            .collect();
        debug!("fetched {} entries in '{dir}'", entries.len());

        self.cache.complete_fetch(ticket, entries);
        Ok(self.cache.get(&self.repository, collection))
    }

    /// Look up a single entry by listing its parent directory.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nothing exists at `path`.
    pub fn stat(&self, path: &str) -> Result<Entry, SyncError> {
        if path.is_empty() {
            return Ok(Entry::directory(""));
        }
        self.remote
            .list_directory(parent_path(path))?
            .into_iter()
            .find(|e| e.path == path)
            .ok_or_else(|| RemoteError::not_found(path).into())
    }

    /// Read a file's raw content.
    ///
    /// # Errors
    ///
    /// Returns the remote error.
    pub fn read_file(&self, path: &str) -> Result<FileContent, SyncError> {
        Ok(self.remote.get_file(path)?)
    }

    /// Open a text file, preferring its autosaved copy.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] for non-UTF-8 content, or the
    /// remote or store error.
    pub fn open_document(&self, path: &str) -> Result<OpenDocument, SyncError> {
        let file = self.remote.get_file(path)?;
        let fetched = String::from_utf8(file.content)
            .map_err(|_| SyncError::validation(format!("'{path}' is not a text file")))?;

        let buffered = match &self.autosave {
            Some(autosave) => autosave.read(&DocumentKey::remote(&self.repository, path))?,
            None => None,
        };
        let restored = buffered.is_some();

        Ok(OpenDocument {
            path: path.to_owned(),
            text: buffered.unwrap_or(fetched),
            version_token: file.version_token,
            restored,
        })
    }

    /// Record an edit of an open document in the autosave buffer.
    pub fn record_edit(&self, path: &str, text: impl Into<String>) {
        if let Some(autosave) = &self.autosave {
            autosave.record(DocumentKey::remote(&self.repository, path), text);
        }
    }

    // Create and update

    /// Create a file named `filename` in a content-root-relative directory.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Validation`] for an empty or invalid name
    /// - `Conflict` if the file already exists
    pub fn create_file(
        &self,
        relative_dir: &str,
        filename: &str,
        content: &[u8],
        message: &str,
    ) -> Result<Entry, SyncError> {
        let path = resolve_content_path(&self.layout, relative_dir, filename)?;
        self.create_at(&path, content, message)
    }

    /// Create a directory by writing the placeholder file inside it.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Validation`] for an empty or invalid name
    /// - `Conflict` if the directory already has a placeholder
    pub fn create_directory(
        &self,
        relative_dir: &str,
        name: &str,
        message: &str,
    ) -> Result<Entry, SyncError> {
        let dir = resolve_content_path(&self.layout, relative_dir, name)?;
        let marker = join_path(&dir, &self.layout.placeholder);

        let inverse = self.patch(&dir, Patch::Insert(Entry::directory(&dir)));
        if let Err(e) = self.remote.put_file(&marker, b"", None, message) {
            warn!("failed to create directory {dir}, rolling back: {e}");
            self.cache.revert(inverse);
            return Err(e.into());
        }

        info!("created directory {dir}");
        Ok(Entry::directory(dir))
    }

    /// Upload a binary file to the asset root.
    ///
    /// Returns the link text for embedding in documents (e.g. `/cat.png`).
    ///
    /// # Errors
    ///
    /// - [`SyncError::Validation`] for an empty or invalid name
    /// - `Conflict` if an asset with this name exists
    pub fn upload_asset(
        &self,
        filename: &str,
        content: &[u8],
        message: &str,
    ) -> Result<String, SyncError> {
        let path = resolve_asset_path(&self.layout, filename)?;
        let link = relative_to_asset_root(&self.layout, &path)?;
        self.create_at(&path, content, message)?;
        Ok(link)
    }

    fn create_at(&self, path: &str, content: &[u8], message: &str) -> Result<Entry, SyncError> {
        let inverse = self.patch(path, Patch::Insert(pending_file(path)));

        match self.remote.put_file(path, content, None, message) {
            Ok(put) => {
                let entry = Entry::file(path, put.version_token);
                let _ = self.patch(path, Patch::Update(entry.clone()));
                info!("created {path}");
                Ok(entry)
            }
            Err(e) => {
                warn!("failed to create {path}, rolling back: {e}");
                self.cache.revert(inverse);
                Err(e.into())
            }
        }
    }

    /// Update an existing file whose last known token is `version_token`.
    ///
    /// On success the autosave buffer for the file is cleared.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the file changed remotely since `version_token`
    /// was read; the autosave buffer is kept.
    pub fn save_file(
        &self,
        path: &str,
        content: &[u8],
        version_token: &str,
        message: &str,
    ) -> Result<Entry, SyncError> {
        let put = self
            .remote
            .put_file(path, content, Some(version_token), message)?;

        let mut entry = self
            .cache
            .entry(&self.repository, self.collection_of(path), path)
            .unwrap_or_else(|| pending_file(path));
        entry.version_token = Some(put.version_token);
        let _ = self.patch(path, Patch::Update(entry.clone()));
        self.clear_autosave(path);

        info!("saved {path}");
        Ok(entry)
    }

    /// Create or update `path`, discovering the current token first.
    ///
    /// # Errors
    ///
    /// Returns the remote error of the lookup or the write.
    pub fn upsert_file(&self, path: &str, content: &[u8], message: &str) -> Result<Entry, SyncError> {
        let existing = match self.remote.get_file(path) {
            Ok(file) => Some(file.version_token),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };
        debug!(
            "writing {path} as {}",
            if existing.is_some() { "update" } else { "create" }
        );

        let put = self
            .remote
            .put_file(path, content, existing.as_deref(), message)?;
        let entry = Entry::file(path, put.version_token);
        let _ = self.patch(path, Patch::Insert(entry.clone()));
        self.clear_autosave(path);

        info!("wrote {path}");
        Ok(entry)
    }

    // Delete

    /// Delete a file, then prune its directory if only the placeholder is left.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Validation`] for directories or entries without a token
    /// - the remote error if the delete fails (cache untouched)
    /// - [`SyncError::PartialFailure`] if the file was deleted but pruning failed
    pub fn delete_file(&self, entry: &Entry, message: &str) -> Result<(), SyncError> {
        if entry.is_dir() {
            return Err(SyncError::validation(format!(
                "'{}' is a directory",
                entry.path
            )));
        }
        let token = entry.version_token.as_deref().ok_or_else(|| {
            SyncError::validation(format!("'{}' has no version token, refresh first", entry.path))
        })?;

        self.remote.delete_file(&entry.path, token, message)?;
        self.tombstone(&entry.path);
        self.clear_autosave(&entry.path);
        info!("deleted {}", entry.path);

        self.prune(entry.parent(), vec![entry.path.clone()], "delete", message)
    }

    /// Delete every file below `dir`, deepest first.
    ///
    /// Returns the deleted paths.
    ///
    /// # Errors
    ///
    /// - the remote error if enumeration or the first delete fails
    /// - [`SyncError::PartialFailure`] naming the failed path once some
    ///   files were deleted
    pub fn delete_directory(&self, dir: &str, message: &str) -> Result<Vec<String>, SyncError> {
        if dir.is_empty() {
            return Err(SyncError::validation("cannot delete the repository root"));
        }

        let mut leaves = Vec::new();
        self.collect_files(dir, &mut leaves)?;

        let mut completed = Vec::new();
        for leaf in &leaves {
            let token = leaf.version_token.as_deref().unwrap_or_default();
            if let Err(e) = self.remote.delete_file(&leaf.path, token, message) {
                if completed.is_empty() {
                    return Err(e.into());
                }
                return Err(partial("delete directory", completed, &leaf.path, e));
            }
            self.tombstone(&leaf.path);
            self.clear_autosave(&leaf.path);
            completed.push(leaf.path.clone());
        }

        self.tombstone(dir);
        info!("deleted directory {dir} ({} files)", completed.len());

        self.prune(parent_path(dir), completed.clone(), "delete directory", message)?;
        Ok(completed)
    }

    /// Depth-first enumeration of the files below `dir`.
    fn collect_files(&self, dir: &str, out: &mut Vec<Entry>) -> Result<(), RemoteError> {
        let mut entries = self.remote.list_directory(dir)?;
        sort_entries(&mut entries);
        for entry in entries {
            if entry.is_dir() {
                self.collect_files(&entry.path, out)?;
            } else {
                out.push(entry);
            }
        }
        Ok(())
    }

    /// Delete placeholders of directories left with nothing else, walking up.
    fn prune(
        &self,
        dir: &str,
        completed: Vec<String>,
        operation: &'static str,
        message: &str,
    ) -> Result<(), SyncError> {
        let mut dir = dir.to_owned();
        while !self.is_root(&dir) {
            let entries = match self.remote.list_directory(&dir) {
                Ok(entries) => entries,
                Err(e) if e.is_not_found() => return Ok(()),
                Err(e) => return Err(partial(operation, completed, dir, e)),
            };
            let [only] = entries.as_slice() else {
                return Ok(());
            };
            if !self.is_placeholder(only) {
                return Ok(());
            }

            let token = only.version_token.as_deref().unwrap_or_default();
            if let Err(e) = self.remote.delete_file(&only.path, token, message) {
                return Err(partial(operation, completed, &only.path, e));
            }
            self.tombstone(&dir);
            info!("pruned empty directory {dir}");
            dir = parent_path(&dir).to_owned();
        }
        Ok(())
    }

    // Rename, move, copy

    /// Rename a file within its directory.
    ///
    /// # Errors
    ///
    /// See [`move_file`](Self::move_file).
    pub fn rename_file(
        &self,
        entry: &Entry,
        new_name: &str,
        message: &str,
    ) -> Result<Entry, SyncError> {
        validate_name(new_name)?;
        self.relocate_file(entry, &join_path(entry.parent(), new_name), "rename", message)
    }

    /// Move a file into `target_dir` (a repository path), keeping its name.
    ///
    /// # Errors
    ///
    /// - the remote error if reading or creating the new file fails; the
    ///   cache is restored exactly
    /// - [`SyncError::PartialFailure`] if the new file was created but the
    ///   old one could not be deleted; both exist remotely and the cache
    ///   shows the new path
    pub fn move_file(
        &self,
        entry: &Entry,
        target_dir: &str,
        message: &str,
    ) -> Result<Entry, SyncError> {
        self.relocate_file(entry, &moved_path(&entry.path, target_dir), "move", message)
    }

    fn relocate_file(
        &self,
        entry: &Entry,
        new_path: &str,
        operation: &'static str,
        message: &str,
    ) -> Result<Entry, SyncError> {
        if entry.is_dir() {
            return Err(SyncError::validation(format!(
                "'{}' is a directory",
                entry.path
            )));
        }
        if new_path == entry.path {
            return Ok(entry.clone());
        }
        let old_token = entry.version_token.clone();

        let inverses = self.relocate_in_cache(&entry.path, entry.relocated(new_path));

        let file = match self.remote.get_file(&entry.path) {
            Ok(file) => file,
            Err(e) => {
                warn!("{operation} of {} failed reading source: {e}", entry.path);
                self.revert_all(inverses);
                return Err(e.into());
            }
        };
        let put = match self.remote.put_file(new_path, &file.content, None, message) {
            Ok(put) => put,
            Err(e) => {
                warn!("{operation} of {} failed creating {new_path}: {e}", entry.path);
                self.revert_all(inverses);
                return Err(e.into());
            }
        };

        let mut moved = entry.relocated(new_path);
        moved.version_token = Some(put.version_token);
        let _ = self.patch(new_path, Patch::Update(moved.clone()));

        let token = old_token.unwrap_or(file.version_token);
        if let Err(e) = self.remote.delete_file(&entry.path, &token, message) {
            return Err(partial(operation, vec![new_path.to_owned()], &entry.path, e));
        }
        self.cache
            .mark_tombstone(&self.repository, self.collection_of(&entry.path), &entry.path);
        info!("{operation}: {} -> {new_path}", entry.path);

        if parent_path(new_path) != entry.parent() {
            self.prune(
                entry.parent(),
                vec![new_path.to_owned(), entry.path.clone()],
                operation,
                message,
            )?;
        }
        Ok(moved)
    }

    /// Copy a file or directory into `target_dir`, file by file.
    ///
    /// # Errors
    ///
    /// - the remote error if nothing was written (cache restored)
    /// - [`SyncError::PartialFailure`] listing the files written so far
    pub fn copy_into(
        &self,
        entry: &Entry,
        target_dir: &str,
        message: &str,
    ) -> Result<Entry, SyncError> {
        self.transfer(entry, target_dir, false, message)
    }

    /// Move a file or directory into `target_dir`, file by file.
    ///
    /// Every source file is deleted right after its copy is written.
    ///
    /// # Errors
    ///
    /// - the remote error if nothing was committed (cache restored)
    /// - [`SyncError::PartialFailure`] listing the paths written and deleted
    pub fn move_into(
        &self,
        entry: &Entry,
        target_dir: &str,
        message: &str,
    ) -> Result<Entry, SyncError> {
        self.transfer(entry, target_dir, true, message)
    }

    fn transfer(
        &self,
        entry: &Entry,
        target_dir: &str,
        remove_source: bool,
        message: &str,
    ) -> Result<Entry, SyncError> {
        let operation = if remove_source { "move" } else { "copy" };
        let destination = moved_path(&entry.path, target_dir);
        if destination == entry.path {
            return Err(SyncError::validation(format!(
                "'{}' is already in '{target_dir}'",
                entry.path
            )));
        }
        if entry.is_dir() && is_within(target_dir, &entry.path) {
            return Err(SyncError::validation(format!(
                "cannot {operation} '{}' into itself",
                entry.path
            )));
        }
        if remove_source && !entry.is_dir() {
            return self.relocate_file(entry, &destination, operation, message);
        }

        let sources = if entry.is_dir() {
            let mut leaves = Vec::new();
            self.collect_files(&entry.path, &mut leaves)?;
            leaves
        } else {
            vec![entry.clone()]
        };

        let inverses = if remove_source {
            self.relocate_in_cache(&entry.path, entry.relocated(&destination))
        } else {
            vec![self.patch(&destination, Patch::Insert(entry.relocated(&destination)))]
        };

        let mut completed: Vec<String> = Vec::new();
        let mut last_token = None;
        for source in &sources {
            let target = match source.path.strip_prefix(entry.path.as_str()) {
                Some(rest) if !rest.is_empty() => format!("{destination}{rest}"),
                _ => destination.clone(),
            };

            let step = self
                .remote
                .get_file(&source.path)
                .map_err(|e| (source.path.clone(), e))
                .and_then(|file| {
                    self.remote
                        .put_file(&target, &file.content, None, message)
                        .map_err(|e| (target.clone(), e))
                });
            let put = match step {
                Ok(put) => put,
                Err((failed, e)) if completed.is_empty() => {
                    warn!("{operation} of {} failed at {failed}, rolling back: {e}", entry.path);
                    self.revert_all(inverses);
                    return Err(e.into());
                }
                Err((failed, e)) => return Err(partial(operation, completed, failed, e)),
            };
            completed.push(target);
            last_token = Some(put.version_token);

            if remove_source {
                let token = source.version_token.as_deref().unwrap_or_default();
                if let Err(e) = self.remote.delete_file(&source.path, token, message) {
                    return Err(partial(operation, completed, &source.path, e));
                }
                self.cache.mark_tombstone(
                    &self.repository,
                    self.collection_of(&source.path),
                    &source.path,
                );
                completed.push(source.path.clone());
            }
        }

        let mut result = entry.relocated(&destination);
        if !entry.is_dir() {
            result.version_token = last_token;
            let _ = self.patch(&destination, Patch::Update(result.clone()));
        }
        info!("{operation}: {} -> {destination}", entry.path);

        if remove_source {
            self.tombstone(&entry.path);
            self.prune(entry.parent(), completed, operation, message)?;
        }
        Ok(result)
    }

    /// Rename a directory in one atomic commit.
    ///
    /// # Errors
    ///
    /// Returns the Tree Rewriter error; the cache is restored exactly.
    pub fn rename_directory(
        &self,
        dir: &Entry,
        new_name: &str,
        message: &str,
    ) -> Result<Entry, SyncError> {
        validate_name(new_name)?;
        self.rewrite_directory(dir, join_path(dir.parent(), new_name), message)
    }

    /// Move a directory into `target_dir` in one atomic commit.
    ///
    /// # Errors
    ///
    /// Returns the Tree Rewriter error; the cache is restored exactly.
    pub fn move_directory(
        &self,
        dir: &Entry,
        target_dir: &str,
        message: &str,
    ) -> Result<Entry, SyncError> {
        self.rewrite_directory(dir, moved_path(&dir.path, target_dir), message)
    }

    fn rewrite_directory(
        &self,
        dir: &Entry,
        destination: String,
        message: &str,
    ) -> Result<Entry, SyncError> {
        if !dir.is_dir() {
            return Err(SyncError::validation(format!(
                "'{}' is not a directory",
                dir.path
            )));
        }
        if self.is_root(&dir.path) {
            return Err(SyncError::validation(format!(
                "cannot move root directory '{}'",
                dir.path
            )));
        }

        let inverses = self.relocate_in_cache(&dir.path, dir.relocated(&destination));
        if let Err(e) = TreeRewriter::new(self.remote.as_ref()).move_subtree(
            &dir.path,
            &destination,
            message,
        ) {
            warn!("moving {} failed, rolling back: {e}", dir.path);
            self.revert_all(inverses);
            return Err(e);
        }

        self.cache
            .mark_tombstone(&self.repository, self.collection_of(&dir.path), &dir.path);
        Ok(Entry::directory(destination))
    }

    // Metadata

    /// Fetch the best-effort modification time and store it on the cached entry.
    ///
    /// # Errors
    ///
    /// Returns the remote error.
    pub fn last_modified(&self, entry: &Entry) -> Result<Option<DateTime<Utc>>, SyncError> {
        let time = self.remote.last_modified(&entry.path)?;
        if let Some(time) = time {
            let mut updated = self
                .cache
                .entry(&self.repository, self.collection_of(&entry.path), &entry.path)
                .unwrap_or_else(|| entry.clone());
            updated.last_modified = Some(time);
            let _ = self.patch(&entry.path, Patch::Update(updated));
        }
        Ok(time)
    }
}
