//! GitHub REST API types.
//!
//! Only fields that are actually used are declared; serde ignores the rest
//! of each response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One item of a `GET /contents/{path}` directory listing.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ContentItem {
    pub name: String,
    pub path: String,
    pub sha: String,
    /// `file`, `dir`, `symlink` or `submodule`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// `GET /contents/{path}` response for a file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FileResponse {
    pub sha: String,
    /// Base64 with embedded newlines; empty for files over 1 MB.
    #[serde(default)]
    pub content: String,
    /// `base64`, or `none` when the content was too large to inline.
    #[serde(default)]
    pub encoding: String,
}

/// `GET /contents/{path}` returns an array for directories and an object for files.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ContentsResponse {
    Directory(Vec<ContentItem>),
    File(FileResponse),
}

/// `GET /git/blobs/{sha}` response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BlobResponse {
    pub content: String,
}

/// `PUT /contents/{path}` response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PutResponse {
    pub content: ShaRef,
}

/// Any object reference carrying only a `sha`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ShaRef {
    pub sha: String,
}

/// `GET /git/ref/heads/{branch}` response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RefResponse {
    pub object: ShaRef,
}

/// `GET /git/commits/{sha}` response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommitResponse {
    pub sha: String,
    pub tree: ShaRef,
}

/// `GET /git/trees/{sha}` response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TreeResponse {
    pub tree: Vec<TreeResponseItem>,
}

/// One item of a tree response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TreeResponseItem {
    pub path: String,
    /// `blob`, `tree` or `commit` (submodule).
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
}

/// One entry of a `POST /git/trees` request.
///
/// `sha: None` serializes as `null`, which deletes the path.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewTreeItem<'a> {
    pub path: &'a str,
    pub mode: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub sha: Option<&'a str>,
}

/// One element of `GET /commits?path=...`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommitListItem {
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommitDetail {
    pub committer: Option<Signature>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Signature {
    pub date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_contents_response_directory() {
        let json = r#"[
            {"name":"a.md","path":"content/a.md","sha":"111","type":"file","size":3},
            {"name":"posts","path":"content/posts","sha":"222","type":"dir","size":0}
        ]"#;

        let response: ContentsResponse = serde_json::from_str(json).unwrap();

        let ContentsResponse::Directory(items) = response else {
            panic!("expected directory listing");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].kind, "dir");
    }

    #[test]
    fn test_contents_response_file() {
        let json = r#"{"type":"file","name":"a.md","path":"a.md","sha":"abc",
            "content":"aGVs\nbG8=\n","encoding":"base64"}"#;

        let response: ContentsResponse = serde_json::from_str(json).unwrap();

        let ContentsResponse::File(file) = response else {
            panic!("expected file");
        };
        assert_eq!(file.sha, "abc");
        assert_eq!(file.encoding, "base64");
    }

    #[test]
    fn test_new_tree_item_serializes_null_sha() {
        let item = NewTreeItem {
            path: "posts/old",
            mode: "040000",
            kind: "tree",
            sha: None,
        };

        let json = serde_json::to_string(&item).unwrap();

        assert_eq!(
            json,
            r#"{"path":"posts/old","mode":"040000","type":"tree","sha":null}"#
        );
    }

    #[test]
    fn test_commit_list_item_date() {
        let json = r#"[{"sha":"x","commit":{"committer":{"name":"a","date":"2024-05-01T10:00:00Z"}}}]"#;

        let items: Vec<CommitListItem> = serde_json::from_str(json).unwrap();

        let date = items[0].commit.committer.as_ref().unwrap().date;
        assert_eq!(date.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }
}
