//! Entry data model shared by the remote backends and the sync layer.
//!
//! # Path Convention
//!
//! All paths are slash-separated and relative to the repository root, with no
//! leading or trailing separator:
//! - `""` - repository root
//! - `"content"` - top-level directory
//! - `"content/posts/hello.md"` - nested file

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of remote entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file (text or binary).
    File,
    /// Directory. Exists only as long as some file lives below it.
    Directory,
}

/// One remote file or directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Repository-relative path, unique within a listing.
    pub path: String,
    /// Last path segment.
    pub name: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Opaque token for conditional update/delete. Never set on directories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_token: Option<String>,
    /// Best-effort modification time, fetched lazily.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl Entry {
    /// Create a file entry.
    #[must_use]
    pub fn file(path: impl Into<String>, version_token: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: file_name(&path).to_owned(),
            path,
            kind: EntryKind::File,
            version_token: Some(version_token.into()),
            last_modified: None,
        }
    }

    /// Create a directory entry.
    #[must_use]
    pub fn directory(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: file_name(&path).to_owned(),
            path,
            kind: EntryKind::Directory,
            version_token: None,
            last_modified: None,
        }
    }

    /// Returns `true` for directory entries.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Path of the directory containing this entry.
    #[must_use]
    pub fn parent(&self) -> &str {
        parent_path(&self.path)
    }

    /// Copy of this entry moved to `path`.
    ///
    /// The version token is dropped: the server assigns a new one once the
    /// entry exists at its new location.
    #[must_use]
    pub fn relocated(&self, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: file_name(&path).to_owned(),
            path,
            kind: self.kind,
            version_token: None,
            last_modified: self.last_modified,
        }
    }
}

/// Last segment of a repository path.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// Parent directory of a repository path (`""` for top-level entries).
#[must_use]
pub fn parent_path(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

/// Join a directory and a name, omitting the separator at the root.
#[must_use]
pub fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_owned()
    } else {
        format!("{dir}/{name}")
    }
}

/// Returns `true` if `path` equals `dir` or lives below it.
#[must_use]
pub fn is_within(path: &str, dir: &str) -> bool {
    dir.is_empty()
        || path == dir
        || path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Listing order: directories before files, each group alphabetical.
///
/// Names compare case-insensitively first so `About.md` sorts next to
/// `about.md`; the exact name breaks ties to keep the order total.
#[must_use]
pub fn listing_order(a: &Entry, b: &Entry) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}

/// Sort entries into listing order.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(listing_order);
}

/// Content and version token of a remote file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileContent {
    /// Raw file bytes.
    pub content: Vec<u8>,
    /// Token to pass to conditional update/delete.
    pub version_token: String,
}

/// Result of a successful put.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutResult {
    /// Token of the newly written file version.
    pub version_token: String,
}

/// Current head of the configured branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchHead {
    /// Head commit id.
    pub commit_id: String,
    /// Root tree of the head commit.
    pub tree_id: String,
}

/// One item of a tree object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeItem {
    /// Name within the tree (single segment).
    pub name: String,
    /// Blob (file) or tree (directory).
    pub kind: EntryKind,
    /// Object id.
    pub id: String,
}

/// One path rewrite applied on top of a base tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeChange {
    /// Repository-relative path of the subtree.
    pub path: String,
    /// Tree object to link at `path`, or `None` to delete it.
    pub tree_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_file_entry() {
        let entry = Entry::file("content/posts/hello.md", "abc");

        assert_eq!(entry.name, "hello.md");
        assert_eq!(entry.parent(), "content/posts");
        assert_eq!(entry.version_token.as_deref(), Some("abc"));
        assert!(!entry.is_dir());
    }

    #[test]
    fn test_directory_entry_has_no_token() {
        let entry = Entry::directory("content/posts");

        assert_eq!(entry.name, "posts");
        assert!(entry.is_dir());
        assert!(entry.version_token.is_none());
    }

    #[test]
    fn test_relocated_drops_token() {
        let entry = Entry::file("a.md", "t1").relocated("drafts/b.md");

        assert_eq!(entry.path, "drafts/b.md");
        assert_eq!(entry.name, "b.md");
        assert_eq!(entry.kind, EntryKind::File);
        assert!(entry.version_token.is_none());
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(file_name("a/b/c.md"), "c.md");
        assert_eq!(file_name("c.md"), "c.md");
        assert_eq!(parent_path("a/b/c.md"), "a/b");
        assert_eq!(parent_path("c.md"), "");
        assert_eq!(join_path("", "c.md"), "c.md");
        assert_eq!(join_path("a/b", "c.md"), "a/b/c.md");
    }

    #[test]
    fn test_is_within() {
        assert!(is_within("posts/old/a.md", "posts/old"));
        assert!(is_within("posts/old", "posts/old"));
        assert!(is_within("anything", ""));
        assert!(!is_within("posts/older/a.md", "posts/old"));
    }

    #[test]
    fn test_sort_entries_directories_first() {
        let mut entries = vec![
            Entry::file("b.md", "1"),
            Entry::directory("zeta"),
            Entry::file("A.md", "2"),
            Entry::directory("alpha"),
        ];

        sort_entries(&mut entries);

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta", "A.md", "b.md"]);
    }
}
