//! File-based store implementation.
//!
//! [`FileStore`] keeps one file per key in a flat directory. File names are
//! the percent-encoded key, so keys containing `/` never collide with each
//! other and prefix listing is a single directory read.
//!
//! Writes go to a temporary sibling first and are renamed into place, so a
//! crash leaves either the old or the new value.
//!
//! On construction, [`FileStore`] validates a `VERSION` file in the root.
//! If the version mismatches or is missing, the directory is wiped and
//! recreated. This ensures data written by an incompatible build is never
//! deserialized.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use crate::{KvStore, StoreError, validate_key};

/// Characters escaped in file names.
const KEY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b'/')
    .add(b'\\')
    .add(b'%')
    .add(b':')
    .add(b'*')
    .add(b'?')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'|')
    .add(b'.');

/// Suffix of in-flight writes; never listed as keys.
const TMP_SUFFIX: &str = ".tmp";

/// File-based [`KvStore`] rooted at a directory on disk.
///
/// Directory layout:
/// ```text
/// {root}/
/// +-- VERSION                          # contains the store version string
/// +-- drafts%2Fblog%2F1f3c...          # key "drafts/blog/1f3c..."
/// +-- autosave%2Fblog%2Fcontent%2Fa%2Emd
/// ```
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a file store at `root`, validating the store version.
    ///
    /// If the `VERSION` file inside `root` does not match `version`, the
    /// entire directory is removed and recreated with the new version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory can't be created.
    pub fn open(root: PathBuf, version: &str) -> Result<Self, StoreError> {
        validate_version(&root, version)?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root
            .join(utf8_percent_encode(key, KEY_ENCODE_SET).to_string())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let path = self.path_for(key);
        let mut tmp = path.clone().into_os_string();
        tmp.push(TMP_SUFFIX);
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn list_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if name == "VERSION" || name.ends_with(TMP_SUFFIX) {
                continue;
            }
            let key = percent_decode_str(&name).decode_utf8_lossy().into_owned();
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Validate the store version, wiping the directory on mismatch.
fn validate_version(root: &Path, version: &str) -> Result<(), StoreError> {
    let version_file = root.join("VERSION");

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!("store version matches: {version}");
            return Ok(());
        }
        Ok(stored) => {
            tracing::info!(
                "store version mismatch (stored={stored}, current={version}), wiping store"
            );
        }
        Err(_) => {
            tracing::info!("no store VERSION file found, initializing store");
        }
    }

    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!("failed to remove store directory: {e}");
    }
    fs::create_dir_all(root)?;
    fs::write(&version_file, version)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn open(tmp: &TempDir) -> FileStore {
        FileStore::open(tmp.path().join("store"), "v1").unwrap()
    }

    #[test]
    fn test_file_store_set_and_get() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);

        store.set("drafts/blog/1", r#"{"title":"Hi"}"#).unwrap();

        assert_eq!(
            store.get("drafts/blog/1").unwrap(),
            Some(r#"{"title":"Hi"}"#.to_owned())
        );
    }

    #[test]
    fn test_file_store_get_missing() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);

        assert_eq!(store.get("nope").unwrap(), None);
    }

    #[test]
    fn test_file_store_overwrite_leaves_no_tmp() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);

        store.set("k", "first").unwrap();
        store.set("k", "second").unwrap();

        assert_eq!(store.get("k").unwrap(), Some("second".to_owned()));
        let names: Vec<_> = fs::read_dir(store.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert!(names.iter().all(|n| !n.ends_with(TMP_SUFFIX)));
    }

    #[test]
    fn test_file_store_remove() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);

        store.set("k", "v").unwrap();
        store.remove("k").unwrap();
        store.remove("k").unwrap();

        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_prefix_listing_decodes_keys() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);

        store.set("autosave/blog/content/a.md", "x").unwrap();
        store.set("autosave/blog/content/b.md", "y").unwrap();
        store.set("drafts/blog/1", "z").unwrap();

        assert_eq!(
            store.list_keys_with_prefix("autosave/blog/").unwrap(),
            vec!["autosave/blog/content/a.md", "autosave/blog/content/b.md"]
        );
    }

    #[test]
    fn test_nested_and_flat_keys_do_not_collide() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);

        store.set("a", "flat").unwrap();
        store.set("a/b", "nested").unwrap();

        assert_eq!(store.get("a").unwrap(), Some("flat".to_owned()));
        assert_eq!(store.get("a/b").unwrap(), Some("nested".to_owned()));
    }

    #[test]
    fn test_version_match_keeps_values() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("store");

        FileStore::open(root.clone(), "v1")
            .unwrap()
            .set("key", "preserved")
            .unwrap();

        let reopened = FileStore::open(root, "v1").unwrap();
        assert_eq!(reopened.get("key").unwrap(), Some("preserved".to_owned()));
    }

    #[test]
    fn test_version_mismatch_wipes_values() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("store");

        FileStore::open(root.clone(), "v1")
            .unwrap()
            .set("key", "stale")
            .unwrap();

        let reopened = FileStore::open(root.clone(), "v2").unwrap();
        assert_eq!(reopened.get("key").unwrap(), None);
        assert_eq!(fs::read_to_string(root.join("VERSION")).unwrap(), "v2");
    }
}
