//! Remote Content API trait.
//!
//! The backend exposes only coarse, per-file operations plus low-level
//! tree/commit/ref primitives. There is no rename, move, or recursive
//! delete, and no consistency guarantee across sequential calls; the sync
//! layer composes these calls into user-level operations.

use chrono::{DateTime, Utc};

use crate::entry::{BranchHead, Entry, FileContent, PutResult, TreeChange, TreeItem};
use crate::error::RemoteError;

/// Remote content repository bound to a single branch.
///
/// Every call is a potential suspension point: implementations may block
/// on network I/O. Paths are repository-relative (see [`crate::entry`]).
pub trait RemoteContent: Send + Sync {
    /// Read a file's content and current version token.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error if the path does not exist or is a directory.
    fn get_file(&self, path: &str) -> Result<FileContent, RemoteError>;

    /// List the immediate children of a directory.
    ///
    /// Directory entries never carry a version token.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error if the path is not a directory.
    fn list_directory(&self, path: &str) -> Result<Vec<Entry>, RemoteError>;

    /// Create or update a file.
    ///
    /// * `expected_version_token = None` - create; fails with `Conflict` if
    ///   the path already exists
    /// * `Some(token)` - update; fails with `Conflict` if the token no
    ///   longer matches the remote version
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on conflict, authentication or network failure.
    fn put_file(
        &self,
        path: &str,
        content: &[u8],
        expected_version_token: Option<&str>,
        message: &str,
    ) -> Result<PutResult, RemoteError>;

    /// Delete a file.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` on token mismatch and `NotFound` if already absent.
    fn delete_file(
        &self,
        path: &str,
        expected_version_token: &str,
        message: &str,
    ) -> Result<(), RemoteError>;

    /// Name of the branch this remote reads and writes.
    fn branch(&self) -> &str;

    /// Current head commit of the branch and its root tree.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the ref cannot be read.
    fn branch_head(&self) -> Result<BranchHead, RemoteError>;

    /// Immediate items of a tree object.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the tree id is unknown.
    fn get_tree(&self, tree_id: &str) -> Result<Vec<TreeItem>, RemoteError>;

    /// Create a tree object by applying `changes` on top of `base_tree_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the base tree or a linked tree is unknown.
    fn create_tree(&self, base_tree_id: &str, changes: &[TreeChange])
    -> Result<String, RemoteError>;

    /// Create a commit object with a single parent.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the tree or parent is unknown.
    fn create_commit(
        &self,
        tree_id: &str,
        parent_commit_id: &str,
        message: &str,
    ) -> Result<String, RemoteError>;

    /// Fast-forward the branch ref to `commit_id`.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the branch head advanced since the commit's
    /// parent was read.
    fn update_ref(&self, commit_id: &str) -> Result<(), RemoteError>;

    /// Best-effort modification time of a path.
    ///
    /// Default implementation returns `Ok(None)` for backends that don't
    /// track history.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the lookup itself fails.
    fn last_modified(&self, _path: &str) -> Result<Option<DateTime<Utc>>, RemoteError> {
        Ok(None)
    }
}
