//! GitHub backend for quire.
//!
//! Implements [`quire_remote::RemoteContent`] over the GitHub REST API:
//! the contents API for per-file reads and writes, and the git data API
//! (refs, commits, trees) for atomic directory moves.
//!
//! Version tokens are git blob shas. Writes are conditional on the sha the
//! caller last saw; GitHub rejects stale shas, which surfaces as a
//! `Conflict` error.

mod backend;
mod client;
mod error;
mod types;

pub use client::{DEFAULT_TIMEOUT, GithubClient};
pub use error::GithubError;
