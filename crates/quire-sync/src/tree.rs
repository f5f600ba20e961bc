//! Tree Rewriter: atomic directory moves through the git data API.
//!
//! A move re-links the subtree object under its new path and unlinks the
//! old path in one new root tree, commits it on top of the branch head and
//! fast-forwards the ref. File contents are never copied. Readers see either
//! the old tree or the new one.

use quire_remote::{EntryKind, RemoteContent, RemoteError, TreeChange, file_name};
use tracing::{info, warn};

use crate::error::SyncError;

/// Attempts made before a ref conflict is surfaced to the caller.
const MAX_ATTEMPTS: usize = 2;

/// Moves whole directories with single commits.
pub struct TreeRewriter<'a> {
    remote: &'a dyn RemoteContent,
}

impl<'a> TreeRewriter<'a> {
    /// Create a rewriter over `remote`.
    pub fn new(remote: &'a dyn RemoteContent) -> Self {
        Self { remote }
    }

    /// Move the directory at `from` to `to` in one commit.
    ///
    /// If the branch head advances between reading it and updating the ref,
    /// the whole sequence is retried once from a fresh head.
    ///
    /// Returns the id of the new head commit.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Validation`] if `to` is inside `from` or a path is empty
    /// - `NotFound` if `from` is not a directory at head
    /// - `Conflict` if `to` already exists, or the ref update conflicted twice
    pub fn move_subtree(&self, from: &str, to: &str, message: &str) -> Result<String, SyncError> {
        if from.is_empty() || to.is_empty() {
            return Err(SyncError::validation("cannot move the repository root"));
        }
        if from == to || quire_remote::is_within(to, from) {
            return Err(SyncError::validation(format!(
                "cannot move '{from}' into itself"
            )));
        }

        let mut attempt = 1;
        loop {
            match self.try_move(from, to, message) {
                Ok(commit_id) => {
                    info!("moved '{from}' to '{to}' in commit {commit_id}");
                    return Ok(commit_id);
                }
                Err(e) if e.is_conflict() && attempt < MAX_ATTEMPTS && e.path() != Some(to) => {
                    warn!("branch head advanced while moving '{from}', retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn try_move(&self, from: &str, to: &str, message: &str) -> Result<String, RemoteError> {
        let head = self.remote.branch_head()?;

        let subtree_id = self
            .find(&head.tree_id, from)?
            .filter(|(kind, _)| *kind == EntryKind::Directory)
            .map(|(_, id)| id)
            .ok_or_else(|| RemoteError::not_found(from).with_message("no such directory"))?;
        if self.find(&head.tree_id, to)?.is_some() {
            return Err(RemoteError::conflict(to).with_message("destination already exists"));
        }

        let changes = [
            TreeChange {
                path: from.to_owned(),
                tree_id: None,
            },
            TreeChange {
                path: to.to_owned(),
                tree_id: Some(subtree_id),
            },
        ];
        let tree_id = self.remote.create_tree(&head.tree_id, &changes)?;
        let commit_id = self
            .remote
            .create_commit(&tree_id, &head.commit_id, message)?;
        self.remote.update_ref(&commit_id)?;
        Ok(commit_id)
    }

    /// Walk from `root_tree` down `path`, returning the kind and id found there.
    fn find(&self, root_tree: &str, path: &str) -> Result<Option<(EntryKind, String)>, RemoteError> {
        let mut current = (EntryKind::Directory, root_tree.to_owned());
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if current.0 != EntryKind::Directory {
                return Ok(None);
            }
            let items = self.remote.get_tree(&current.1)?;
            match items.into_iter().find(|item| item.name == segment) {
                Some(item) => current = (item.kind, item.id),
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}

/// Destination of moving `dir` into `target_dir`.
pub(crate) fn moved_path(dir: &str, target_dir: &str) -> String {
    quire_remote::join_path(target_dir, file_name(dir))
}
