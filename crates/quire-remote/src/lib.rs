//! Remote content abstraction for quire.
//!
//! This crate provides the [`RemoteContent`] trait: the narrow, per-file
//! interface a remote version-controlled repository exposes (read, create or
//! update with an expected version, delete with an expected version, list a
//! directory) plus the tree/commit/ref primitives needed for atomic
//! multi-path changes.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`Entry`] and friends: the data model shared with the sync layer
//! - [`RemoteError`] with a semantic [`RemoteErrorKind`]
//! - [`RemoteContent`] trait implemented by backends (e.g. `quire-github`)
//! - [`MockRemote`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use quire_remote::{MockRemote, RemoteContent};
//!
//! let remote = MockRemote::new().with_file("content/hello.md", "# Hello");
//! for entry in remote.list_directory("content")? {
//!     println!("{} ({:?})", entry.path, entry.kind);
//! }
//! ```

mod entry;
mod error;
#[cfg(feature = "mock")]
mod mock;
mod remote;

pub use entry::{
    BranchHead, Entry, EntryKind, FileContent, PutResult, TreeChange, TreeItem, file_name,
    is_within, join_path, listing_order, parent_path, sort_entries,
};
pub use error::{RemoteError, RemoteErrorKind};
#[cfg(feature = "mock")]
pub use mock::{MockCall, MockOp, MockRemote};
pub use remote::RemoteContent;
