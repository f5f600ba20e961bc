//! Remote-backed content synchronization for quire.
//!
//! This crate makes a per-file remote repository API behave like a
//! responsive local file system. It composes single-file calls into
//! rename, move, copy and recursive delete, keeps a local listing cache
//! consistent with in-flight mutations, and manages local drafts.
//!
//! # Architecture
//!
//! - [`paths`]: logical names to repository paths and back
//! - [`CacheStore`]: per-repository listings with optimistic patches,
//!   tombstones and a stale-fetch guard, mirrored to a [`quire_store::KvStore`]
//! - [`Coordinator`]: user-level mutations with exact rollback and
//!   [`PartialFailure`] reporting
//! - [`TreeRewriter`]: atomic directory moves through tree and commit objects
//! - [`Drafts`]: local documents and create-or-update publishing
//! - [`Autosave`]: debounced buffer of unsaved edits
//! - [`Flusher`]: background thread driving the debounced writes
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use quire_sync::{CacheStore, Coordinator};
//!
//! let coordinator = Coordinator::new(&repository, remote, Arc::new(CacheStore::new()));
//! for entry in coordinator.list("content/posts")? {
//!     println!("{}", entry.name);
//! }
//! let a = coordinator.stat("content/posts/a.md")?;
//! coordinator.rename_file(&a, "b.md", "Rename a.md")?;
//! ```

mod autosave;
mod cache;
mod coordinator;
mod debouncer;
mod drafts;
mod error;
mod flusher;
pub mod paths;
#[cfg(test)]
mod testing;
mod tree;

pub use autosave::{Autosave, DocumentKey};
pub use cache::{CacheStore, Collection, FetchTicket, Inverse, Patch};
pub use coordinator::{Coordinator, OpenDocument};
pub use drafts::{Draft, Drafts, slugify};
pub use error::{ErrorKind, PartialFailure, SyncError};
pub use flusher::Flusher;
pub use tree::TreeRewriter;
