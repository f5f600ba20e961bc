//! Contents API operations: per-file read, write and delete.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use quire_remote::{Entry, FileContent, join_path};
use serde_json::json;
use tracing::{debug, info};

use super::{GithubClient, Method, QUERY_VALUE};
use crate::error::GithubError;
use crate::types::{
    BlobResponse, CommitListItem, ContentItem, ContentsResponse, FileResponse, PutResponse,
};

/// Outcome of reading a contents path.
pub(crate) enum Contents {
    File(FileContent),
    Directory(Vec<Entry>),
}

impl GithubClient {
    /// Read a file or directory at `path` on the branch.
    pub(crate) fn fetch_contents(&self, path: &str) -> Result<Contents, GithubError> {
        let url = format!("{}?ref={}", self.contents_url(path), self.branch_query());

        match self.get_json::<ContentsResponse>(&url)? {
            ContentsResponse::Directory(items) => {
                let entries = items
                    .into_iter()
                    .filter_map(|item| to_entry(path, item))
                    .collect::<Vec<_>>();
                debug!("Listed {} entries in '{}'", entries.len(), path);
                Ok(Contents::Directory(entries))
            }
            ContentsResponse::File(file) => Ok(Contents::File(self.decode_file(file)?)),
        }
    }

    /// Create or update a file.
    ///
    /// Returns the blob sha of the new file version.
    pub(crate) fn write_file(
        &self,
        path: &str,
        content: &[u8],
        sha: Option<&str>,
        message: &str,
    ) -> Result<String, GithubError> {
        let mut payload = json!({
            "message": message,
            "content": STANDARD.encode(content),
            "branch": self.branch,
        });
        if let Some(sha) = sha {
            payload["sha"] = json!(sha);
            info!("Updating '{}' ({} bytes)", path, content.len());
        } else {
            info!("Creating '{}' ({} bytes)", path, content.len());
        }

        let response: PutResponse =
            self.send_json(Method::Put, &self.contents_url(path), &payload)?;
        Ok(response.content.sha)
    }

    /// Delete a file whose current blob sha is `sha`.
    pub(crate) fn remove_file(
        &self,
        path: &str,
        sha: &str,
        message: &str,
    ) -> Result<(), GithubError> {
        let payload = json!({
            "message": message,
            "sha": sha,
            "branch": self.branch,
        });

        info!("Deleting '{}'", path);
        let _: serde_json::Value =
            self.send_json(Method::Delete, &self.contents_url(path), &payload)?;
        Ok(())
    }

    /// Commit time of the latest commit touching `path`.
    pub(crate) fn fetch_last_modified(
        &self,
        path: &str,
    ) -> Result<Option<DateTime<Utc>>, GithubError> {
        let url = format!(
            "{}/commits?path={}&sha={}&per_page=1",
            self.repo_url(),
            percent_encoding::utf8_percent_encode(path, QUERY_VALUE),
            self.branch_query()
        );

        let commits: Vec<CommitListItem> = self.get_json(&url)?;
        Ok(commits
            .into_iter()
            .next()
            .and_then(|item| item.commit.committer)
            .map(|signature| signature.date))
    }

    /// Decode inline content, falling back to the blob API for large files.
    fn decode_file(&self, file: FileResponse) -> Result<FileContent, GithubError> {
        let encoded = if file.encoding == "none" {
            debug!("Content of blob {} not inlined, fetching blob", file.sha);
            let url = format!("{}/git/blobs/{}", self.repo_url(), file.sha);
            self.get_json::<BlobResponse>(&url)?.content
        } else {
            file.content
        };

        Ok(FileContent {
            content: decode_base64(&encoded)?,
            version_token: file.sha,
        })
    }
}

/// Convert a listing item to an [`Entry`]; submodules are skipped.
fn to_entry(dir: &str, item: ContentItem) -> Option<Entry> {
    let path = join_path(dir, &item.name);
    match item.kind.as_str() {
        "dir" => Some(Entry::directory(path)),
        "file" | "symlink" => Some(Entry::file(path, item.sha)),
        other => {
            debug!("Skipping '{}' of type '{}'", item.path, other);
            None
        }
    }
}

/// Decode GitHub's line-wrapped base64.
pub(crate) fn decode_base64(encoded: &str) -> Result<Vec<u8>, GithubError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quire_remote::EntryKind;

    use super::*;

    fn item(name: &str, kind: &str) -> ContentItem {
        ContentItem {
            name: name.to_owned(),
            path: format!("content/{name}"),
            sha: format!("sha-{name}"),
            kind: kind.to_owned(),
        }
    }

    #[test]
    fn test_decode_base64_strips_newlines() {
        assert_eq!(decode_base64("aGVs\nbG8g\nd29y\nbGQ=\n").unwrap(), b"hello world");
    }

    #[test]
    fn test_decode_base64_empty() {
        assert_eq!(decode_base64("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decode_base64_invalid() {
        assert!(matches!(
            decode_base64("not base64!"),
            Err(GithubError::Base64(_))
        ));
    }

    #[test]
    fn test_to_entry_file_carries_token() {
        let entry = to_entry("content", item("a.md", "file")).unwrap();

        assert_eq!(entry.path, "content/a.md");
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(entry.version_token.as_deref(), Some("sha-a.md"));
    }

    #[test]
    fn test_to_entry_directory_has_no_token() {
        let entry = to_entry("content", item("posts", "dir")).unwrap();

        assert_eq!(entry.kind, EntryKind::Directory);
        assert_eq!(entry.version_token, None);
    }

    #[test]
    fn test_to_entry_skips_submodule() {
        assert!(to_entry("content", item("vendor", "submodule")).is_none());
    }
}
