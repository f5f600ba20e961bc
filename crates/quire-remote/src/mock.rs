//! Mock remote implementation for testing.
//!
//! Provides [`MockRemote`], an in-memory repository with files, version
//! tokens, tree snapshots, commits and a single branch ref. Every call is
//! recorded, and failures can be injected per operation and path.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::entry::{
    BranchHead, Entry, EntryKind, FileContent, PutResult, TreeChange, TreeItem, is_within,
};
use crate::error::{RemoteError, RemoteErrorKind};
use crate::remote::RemoteContent;

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

/// Operation recorded by [`MockRemote`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MockOp {
    GetFile,
    ListDirectory,
    PutFile,
    DeleteFile,
    BranchHead,
    GetTree,
    CreateTree,
    CreateCommit,
    UpdateRef,
}

/// A recorded call: the operation and its path (or object id).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockCall {
    pub op: MockOp,
    pub target: String,
}

#[derive(Clone, Debug)]
struct Blob {
    content: Vec<u8>,
    token: String,
}

impl Blob {
    fn new(content: &[u8]) -> Self {
        Self {
            content: content.to_vec(),
            token: token_for(content),
        }
    }
}

type Snapshot = BTreeMap<String, Blob>;

#[derive(Debug)]
struct MockCommit {
    tree_id: String,
    parent: Option<String>,
}

#[derive(Debug)]
struct Failure {
    op: MockOp,
    target: Option<String>,
    kind: RemoteErrorKind,
}

#[derive(Debug, Default)]
struct State {
    files: Snapshot,
    trees: HashMap<String, Snapshot>,
    commits: HashMap<String, MockCommit>,
    head: String,
    next_id: u64,
    failures: Vec<Failure>,
    concurrent_advances: usize,
    calls: Vec<MockCall>,
    timestamps: HashMap<String, DateTime<Utc>>,
}

impl State {
    fn alloc(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    /// Snapshot the working files into a new tree and commit on top of head.
    fn commit_files(&mut self) {
        let tree_id = self.alloc("tree");
        self.trees.insert(tree_id.clone(), self.files.clone());
        let commit_id = self.alloc("commit");
        let parent = (!self.head.is_empty()).then(|| self.head.clone());
        self.commits
            .insert(commit_id.clone(), MockCommit { tree_id, parent });
        self.head = commit_id;
    }

    fn record(&mut self, op: MockOp, target: &str) -> Result<(), RemoteError> {
        self.calls.push(MockCall {
            op,
            target: target.to_owned(),
        });
        let position = self.failures.iter().position(|f| {
            f.op == op && f.target.as_deref().is_none_or(|t| t == target)
        });
        match position {
            Some(index) => {
                let failure = self.failures.remove(index);
                Err(RemoteError::new(failure.kind)
                    .with_path(target)
                    .with_backend(BACKEND)
                    .with_message("injected failure"))
            }
            None => Ok(()),
        }
    }

    /// Resolve a tree id (`tree-N` or `tree-N:sub/path`) to its snapshot and prefix.
    fn resolve_tree(&self, tree_id: &str) -> Result<(&Snapshot, String), RemoteError> {
        let (root, prefix) = tree_id.split_once(':').unwrap_or((tree_id, ""));
        let snapshot = self
            .trees
            .get(root)
            .ok_or_else(|| not_found(tree_id))?;
        Ok((snapshot, prefix.to_owned()))
    }
}

fn token_for(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    hex::encode(&result[..20])
}

fn not_found(target: &str) -> RemoteError {
    RemoteError::not_found(target).with_backend(BACKEND)
}

fn conflict(target: &str) -> RemoteError {
    RemoteError::conflict(target).with_backend(BACKEND)
}

/// Immediate children of `dir` within a snapshot, as `(name, kind, file)`.
fn children<'a>(snapshot: &'a Snapshot, dir: &str) -> BTreeMap<String, Option<&'a Blob>> {
    let mut out = BTreeMap::new();
    for (path, blob) in snapshot {
        let rest = if dir.is_empty() {
            path.as_str()
        } else {
            match path.strip_prefix(dir).and_then(|r| r.strip_prefix('/')) {
                Some(rest) => rest,
                None => continue,
            }
        };
        match rest.split_once('/') {
            Some((segment, _)) => {
                out.insert(segment.to_owned(), None);
            }
            None => {
                out.insert(rest.to_owned(), Some(blob));
            }
        }
    }
    out
}

/// In-memory Remote Content API for testing.
///
/// # Example
///
/// ```ignore
/// use quire_remote::{MockRemote, MockOp, RemoteContent, RemoteErrorKind};
///
/// let remote = MockRemote::new().with_file("content/a.md", "hello");
/// remote.fail_on(MockOp::DeleteFile, "content/a.md", RemoteErrorKind::Network);
///
/// let file = remote.get_file("content/a.md").unwrap();
/// ```
#[derive(Debug)]
pub struct MockRemote {
    branch: String,
    state: Mutex<State>,
}

impl Default for MockRemote {
    fn default() -> Self {
        let mut state = State::default();
        state.commit_files();
        Self {
            branch: "main".to_owned(),
            state: Mutex::new(state),
        }
    }
}

impl MockRemote {
    /// Create an empty repository with a single root commit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file (committed immediately).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, path: impl Into<String>, content: impl AsRef<[u8]>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.files.insert(path.into(), Blob::new(content.as_ref()));
            state.commit_files();
        }
        self
    }

    /// Set the modification time reported for a path.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_last_modified(self, path: impl Into<String>, time: DateTime<Utc>) -> Self {
        self.state
            .lock()
            .unwrap()
            .timestamps
            .insert(path.into(), time);
        self
    }

    /// Fail the next call of `op`, whatever its target.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn fail_next(&self, op: MockOp, kind: RemoteErrorKind) {
        self.state.lock().unwrap().failures.push(Failure {
            op,
            target: None,
            kind,
        });
    }

    /// Fail the next call of `op` targeting `target`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn fail_on(&self, op: MockOp, target: impl Into<String>, kind: RemoteErrorKind) {
        self.state.lock().unwrap().failures.push(Failure {
            op,
            target: Some(target.into()),
            kind,
        });
    }

    /// Simulate `count` concurrent commits landing just before the next
    /// `update_ref` calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn advance_head_before_update_ref(&self, count: usize) {
        self.state.lock().unwrap().concurrent_advances = count;
    }

    /// Change a file as an external editor would (new commit, new token).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn edit_externally(&self, path: impl Into<String>, content: impl AsRef<[u8]>) {
        let mut state = self.state.lock().unwrap();
        state.files.insert(path.into(), Blob::new(content.as_ref()));
        state.commit_files();
    }

    /// Current content of a file at head.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(path)
            .map(|b| b.content.clone())
    }

    /// Current version token of a file at head.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn token(&self, path: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(path)
            .map(|b| b.token.clone())
    }

    /// Returns `true` if a file exists at `path`.
    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        self.file(path).is_some()
    }

    /// All file paths at head, sorted.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.state.lock().unwrap().files.keys().cloned().collect()
    }

    /// Every call made so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls of a single operation, in order.
    #[must_use]
    pub fn calls_of(&self, op: MockOp) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.op == op)
            .map(|c| c.target)
            .collect()
    }

    /// Number of commits reachable from head (including the root commit).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        let mut count = 0;
        let mut cursor = Some(state.head.clone());
        while let Some(id) = cursor {
            count += 1;
            cursor = state.commits.get(&id).and_then(|c| c.parent.clone());
        }
        count
    }
}

impl RemoteContent for MockRemote {
    fn get_file(&self, path: &str) -> Result<FileContent, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.record(MockOp::GetFile, path)?;
        state
            .files
            .get(path)
            .map(|b| FileContent {
                content: b.content.clone(),
                version_token: b.token.clone(),
            })
            .ok_or_else(|| not_found(path))
    }

    fn list_directory(&self, path: &str) -> Result<Vec<Entry>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.record(MockOp::ListDirectory, path)?;
        let items = children(&state.files, path);
        if items.is_empty() && !path.is_empty() {
            return Err(not_found(path));
        }
        Ok(items
            .into_iter()
            .map(|(name, blob)| {
                let full = crate::entry::join_path(path, &name);
                match blob {
                    Some(blob) => Entry::file(full, blob.token.clone()),
                    None => Entry::directory(full),
                }
            })
            .collect())
    }

    fn put_file(
        &self,
        path: &str,
        content: &[u8],
        expected_version_token: Option<&str>,
        _message: &str,
    ) -> Result<PutResult, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.record(MockOp::PutFile, path)?;
        if path.is_empty() || path.split('/').any(str::is_empty) {
            return Err(RemoteError::new(RemoteErrorKind::Validation)
                .with_path(path)
                .with_backend(BACKEND));
        }
        match (state.files.get(path), expected_version_token) {
            (Some(_), None) => return Err(conflict(path)),
            (None, Some(_)) => return Err(not_found(path)),
            (Some(blob), Some(token)) if blob.token != token => return Err(conflict(path)),
            _ => {}
        }
        if state.files.keys().any(|p| p != path && is_within(p, path)) {
            return Err(conflict(path));
        }
        let blob = Blob::new(content);
        let version_token = blob.token.clone();
        state.files.insert(path.to_owned(), blob);
        state.commit_files();
        Ok(PutResult { version_token })
    }

    fn delete_file(
        &self,
        path: &str,
        expected_version_token: &str,
        _message: &str,
    ) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.record(MockOp::DeleteFile, path)?;
        match state.files.get(path) {
            None => return Err(not_found(path)),
            Some(blob) if blob.token != expected_version_token => return Err(conflict(path)),
            Some(_) => {}
        }
        state.files.remove(path);
        state.commit_files();
        Ok(())
    }

    fn branch(&self) -> &str {
        &self.branch
    }

    fn branch_head(&self) -> Result<BranchHead, RemoteError> {
        let mut state = self.state.lock().unwrap();
        let head = state.head.clone();
        state.record(MockOp::BranchHead, &head)?;
        let tree_id = state
            .commits
            .get(&head)
            .map(|c| c.tree_id.clone())
            .ok_or_else(|| not_found(&head))?;
        Ok(BranchHead {
            commit_id: head,
            tree_id,
        })
    }

    fn get_tree(&self, tree_id: &str) -> Result<Vec<TreeItem>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.record(MockOp::GetTree, tree_id)?;
        let (snapshot, prefix) = state.resolve_tree(tree_id)?;
        let root = tree_id.split_once(':').map_or(tree_id, |(root, _)| root);
        let items = children(snapshot, &prefix);
        if items.is_empty() && !prefix.is_empty() {
            return Err(not_found(tree_id));
        }
        Ok(items
            .into_iter()
            .map(|(name, blob)| match blob {
                Some(blob) => TreeItem {
                    name,
                    kind: EntryKind::File,
                    id: blob.token.clone(),
                },
                None => TreeItem {
                    id: format!("{root}:{}", crate::entry::join_path(&prefix, &name)),
                    name,
                    kind: EntryKind::Directory,
                },
            })
            .collect())
    }

    fn create_tree(
        &self,
        base_tree_id: &str,
        changes: &[TreeChange],
    ) -> Result<String, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.record(MockOp::CreateTree, base_tree_id)?;
        let mut tree = state
            .trees
            .get(base_tree_id)
            .cloned()
            .ok_or_else(|| not_found(base_tree_id))?;

        for change in changes {
            let linked: Vec<(String, Blob)> = match &change.tree_id {
                Some(id) => {
                    let (snapshot, prefix) = state.resolve_tree(id)?;
                    snapshot
                        .iter()
                        .filter(|(p, _)| !prefix.is_empty() && is_within(p, &prefix))
                        .filter_map(|(p, blob)| {
                            let rest = p.strip_prefix(prefix.as_str())?.strip_prefix('/')?;
                            Some((format!("{}/{rest}", change.path), blob.clone()))
                        })
                        .collect()
                }
                None => Vec::new(),
            };
            tree.retain(|p, _| !is_within(p, &change.path));
            tree.extend(linked);
        }

        let tree_id = state.alloc("tree");
        state.trees.insert(tree_id.clone(), tree);
        Ok(tree_id)
    }

    fn create_commit(
        &self,
        tree_id: &str,
        parent_commit_id: &str,
        _message: &str,
    ) -> Result<String, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.record(MockOp::CreateCommit, tree_id)?;
        if !state.trees.contains_key(tree_id) {
            return Err(not_found(tree_id));
        }
        if !state.commits.contains_key(parent_commit_id) {
            return Err(not_found(parent_commit_id));
        }
        let commit_id = state.alloc("commit");
        state.commits.insert(
            commit_id.clone(),
            MockCommit {
                tree_id: tree_id.to_owned(),
                parent: Some(parent_commit_id.to_owned()),
            },
        );
        Ok(commit_id)
    }

    fn update_ref(&self, commit_id: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.record(MockOp::UpdateRef, commit_id)?;
        if state.concurrent_advances > 0 {
            state.concurrent_advances -= 1;
            state.commit_files();
        }
        let commit = state
            .commits
            .get(commit_id)
            .ok_or_else(|| not_found(commit_id))?;
        if commit.parent.as_deref() != Some(state.head.as_str()) {
            return Err(conflict(commit_id).with_message("branch head advanced"));
        }
        let files = state
            .trees
            .get(&commit.tree_id)
            .cloned()
            .ok_or_else(|| not_found(commit_id))?;
        state.files = files;
        state.head = commit_id.to_owned();
        Ok(())
    }

    fn last_modified(&self, path: &str) -> Result<Option<DateTime<Utc>>, RemoteError> {
        Ok(self.state.lock().unwrap().timestamps.get(path).copied())
    }
}
