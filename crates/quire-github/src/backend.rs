//! [`RemoteContent`] implementation for [`GithubClient`].

use chrono::{DateTime, Utc};
use quire_remote::{
    BranchHead, Entry, FileContent, PutResult, RemoteContent, RemoteError, TreeChange, TreeItem,
};

use crate::client::{Contents, GithubClient};
use crate::error::BACKEND;

impl RemoteContent for GithubClient {
    fn get_file(&self, path: &str) -> Result<FileContent, RemoteError> {
        match self.fetch_contents(path).map_err(|e| e.into_remote(path))? {
            Contents::File(file) => Ok(file),
            Contents::Directory(_) => Err(RemoteError::not_found(path)
                .with_backend(BACKEND)
                .with_message("path is a directory")),
        }
    }

    fn list_directory(&self, path: &str) -> Result<Vec<Entry>, RemoteError> {
        match self.fetch_contents(path).map_err(|e| e.into_remote(path))? {
            Contents::Directory(entries) => Ok(entries),
            Contents::File(_) => Err(RemoteError::not_found(path)
                .with_backend(BACKEND)
                .with_message("path is a file")),
        }
    }

    fn put_file(
        &self,
        path: &str,
        content: &[u8],
        expected_version_token: Option<&str>,
        message: &str,
    ) -> Result<PutResult, RemoteError> {
        let version_token = self
            .write_file(path, content, expected_version_token, message)
            .map_err(|e| e.into_remote(path))?;
        Ok(PutResult { version_token })
    }

    fn delete_file(
        &self,
        path: &str,
        expected_version_token: &str,
        message: &str,
    ) -> Result<(), RemoteError> {
        self.remove_file(path, expected_version_token, message)
            .map_err(|e| e.into_remote(path))
    }

    fn branch(&self) -> &str {
        GithubClient::branch(self)
    }

    fn branch_head(&self) -> Result<BranchHead, RemoteError> {
        self.fetch_head()
            .map_err(|e| e.into_remote(GithubClient::branch(self)))
    }

    fn get_tree(&self, tree_id: &str) -> Result<Vec<TreeItem>, RemoteError> {
        self.fetch_tree(tree_id).map_err(|e| e.into_remote(tree_id))
    }

    fn create_tree(
        &self,
        base_tree_id: &str,
        changes: &[TreeChange],
    ) -> Result<String, RemoteError> {
        self.post_tree(base_tree_id, changes)
            .map_err(|e| e.into_remote(base_tree_id))
    }

    fn create_commit(
        &self,
        tree_id: &str,
        parent_commit_id: &str,
        message: &str,
    ) -> Result<String, RemoteError> {
        self.post_commit(tree_id, parent_commit_id, message)
            .map_err(|e| e.into_remote(tree_id))
    }

    fn update_ref(&self, commit_id: &str) -> Result<(), RemoteError> {
        self.patch_ref(commit_id)
            .map_err(|e| e.into_remote(GithubClient::branch(self)))
    }

    fn last_modified(&self, path: &str) -> Result<Option<DateTime<Utc>>, RemoteError> {
        self.fetch_last_modified(path)
            .map_err(|e| e.into_remote(path))
    }
}
