//! Git data API operations: refs, commits and trees.

use quire_remote::{BranchHead, EntryKind, TreeChange, TreeItem};
use serde_json::json;
use tracing::{debug, info};

use super::{GithubClient, Method, encode_path};
use crate::error::GithubError;
use crate::types::{CommitResponse, NewTreeItem, RefResponse, ShaRef, TreeResponse};

/// Git mode of a directory entry.
const TREE_MODE: &str = "040000";

impl GithubClient {
    fn ref_url(&self, prefix: &str) -> String {
        format!(
            "{}/git/{prefix}/heads/{}",
            self.repo_url(),
            encode_path(&self.branch)
        )
    }

    /// Read the branch head commit and its root tree.
    pub(crate) fn fetch_head(&self) -> Result<BranchHead, GithubError> {
        let reference: RefResponse = self.get_json(&self.ref_url("ref"))?;
        let url = format!("{}/git/commits/{}", self.repo_url(), reference.object.sha);
        let commit: CommitResponse = self.get_json(&url)?;

        debug!("Branch '{}' at {}", self.branch, commit.sha);
        Ok(BranchHead {
            commit_id: commit.sha,
            tree_id: commit.tree.sha,
        })
    }

    /// Read the immediate items of a tree.
    pub(crate) fn fetch_tree(&self, tree_id: &str) -> Result<Vec<TreeItem>, GithubError> {
        let url = format!("{}/git/trees/{tree_id}", self.repo_url());
        let response: TreeResponse = self.get_json(&url)?;

        Ok(response
            .tree
            .into_iter()
            .filter_map(|item| {
                let kind = match item.kind.as_str() {
                    "blob" => EntryKind::File,
                    "tree" => EntryKind::Directory,
                    _ => return None,
                };
                Some(TreeItem {
                    name: item.path,
                    kind,
                    id: item.sha,
                })
            })
            .collect())
    }

    /// Create a tree from `base_tree_id` with directory links replaced or removed.
    pub(crate) fn post_tree(
        &self,
        base_tree_id: &str,
        changes: &[TreeChange],
    ) -> Result<String, GithubError> {
        let items: Vec<NewTreeItem<'_>> = changes
            .iter()
            .map(|change| NewTreeItem {
                path: &change.path,
                mode: TREE_MODE,
                kind: "tree",
                sha: change.tree_id.as_deref(),
            })
            .collect();
        let payload = json!({
            "base_tree": base_tree_id,
            "tree": items,
        });

        let url = format!("{}/git/trees", self.repo_url());
        let tree: ShaRef = self.send_json(Method::Post, &url, &payload)?;
        debug!("Created tree {} from base {}", tree.sha, base_tree_id);
        Ok(tree.sha)
    }

    /// Create a single-parent commit.
    pub(crate) fn post_commit(
        &self,
        tree_id: &str,
        parent_commit_id: &str,
        message: &str,
    ) -> Result<String, GithubError> {
        let payload = json!({
            "message": message,
            "tree": tree_id,
            "parents": [parent_commit_id],
        });

        let url = format!("{}/git/commits", self.repo_url());
        let commit: ShaRef = self.send_json(Method::Post, &url, &payload)?;
        debug!("Created commit {} on parent {}", commit.sha, parent_commit_id);
        Ok(commit.sha)
    }

    /// Fast-forward the branch to `commit_id`.
    pub(crate) fn patch_ref(&self, commit_id: &str) -> Result<(), GithubError> {
        let payload = json!({
            "sha": commit_id,
            "force": false,
        });

        info!("Moving branch '{}' to {}", self.branch, commit_id);
        let _: serde_json::Value = self.send_json(Method::Patch, &self.ref_url("refs"), &payload)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_ref_urls_keep_branch_slashes() {
        let client = GithubClient::new(
            "https://api.github.com",
            "acme",
            "site",
            "release/v2",
            "t",
            Duration::from_secs(5),
        );

        assert_eq!(
            client.ref_url("ref"),
            "https://api.github.com/repos/acme/site/git/ref/heads/release/v2"
        );
        assert_eq!(
            client.ref_url("refs"),
            "https://api.github.com/repos/acme/site/git/refs/heads/release/v2"
        );
    }
}
