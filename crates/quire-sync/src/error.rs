//! Error taxonomy of the sync layer.

use quire_remote::{RemoteError, RemoteErrorKind};
use quire_store::StoreError;

/// Caller-facing failure category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Path absent or version token stale; refetch and retry.
    NotFound,
    /// Version token or branch ref mismatch after a concurrent edit.
    Conflict,
    /// A multi-step operation stopped partway.
    PartialFailure,
    /// Missing or rejected credentials.
    Unauthenticated,
    /// Transport failure.
    NetworkError,
    /// Rejected before any remote call (bad name, malformed layout).
    ValidationError,
    /// Anything else, including local store failures.
    Other,
}

impl From<RemoteErrorKind> for ErrorKind {
    fn from(kind: RemoteErrorKind) -> Self {
        match kind {
            RemoteErrorKind::NotFound => Self::NotFound,
            RemoteErrorKind::Conflict => Self::Conflict,
            RemoteErrorKind::Unauthenticated => Self::Unauthenticated,
            RemoteErrorKind::Network => Self::NetworkError,
            RemoteErrorKind::Validation => Self::ValidationError,
            _ => Self::Other,
        }
    }
}

/// Outcome of a multi-step mutation where some but not all steps committed.
///
/// `completed` lists the path each committed remote call touched, in
/// order. `failed` is the path of the call that failed.
#[derive(Debug, thiserror::Error)]
#[error("{operation} stopped at '{failed}' after {} completed step(s)", .completed.len())]
pub struct PartialFailure {
    /// Name of the user-level operation (e.g. `"rename"`).
    pub operation: &'static str,
    /// Paths of the sub-steps that committed.
    pub completed: Vec<String>,
    /// Path of the sub-step that failed.
    pub failed: String,
    /// Error returned by the failed sub-step.
    #[source]
    pub source: RemoteError,
}

/// Error from a sync layer operation.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A single remote call failed; nothing was committed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A multi-step operation committed some steps before failing.
    #[error(transparent)]
    PartialFailure(Box<PartialFailure>),

    /// Input rejected before any remote call.
    #[error("validation error: {0}")]
    Validation(String),

    /// No draft with this id exists locally.
    #[error("draft not found: {0}")]
    DraftNotFound(String),

    /// Local durable store failed.
    #[error("local store error: {0}")]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Build a validation error.
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Failure category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Remote(e) => e.kind().into(),
            Self::PartialFailure(_) => ErrorKind::PartialFailure,
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::DraftNotFound(_) => ErrorKind::NotFound,
            Self::Store(_) => ErrorKind::Other,
        }
    }

    /// The partial failure details, if this is one.
    #[must_use]
    pub fn as_partial(&self) -> Option<&PartialFailure> {
        match self {
            Self::PartialFailure(partial) => Some(partial),
            _ => None,
        }
    }
}

impl From<PartialFailure> for SyncError {
    fn from(partial: PartialFailure) -> Self {
        Self::PartialFailure(Box::new(partial))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_remote_kind_preserved() {
        let err = SyncError::from(RemoteError::conflict("content/a.md"));

        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_network_kind_mapping() {
        let err = SyncError::from(RemoteError::new(RemoteErrorKind::Network));

        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }

    #[test]
    fn test_partial_failure_display() {
        let err = SyncError::from(PartialFailure {
            operation: "rename",
            completed: vec!["content/b.md".to_owned()],
            failed: "content/a.md".to_owned(),
            source: RemoteError::new(RemoteErrorKind::Network),
        });

        assert_eq!(err.kind(), ErrorKind::PartialFailure);
        assert_eq!(
            err.to_string(),
            "rename stopped at 'content/a.md' after 1 completed step(s)"
        );
        assert_eq!(err.as_partial().unwrap().completed, vec!["content/b.md"]);
    }

    #[test]
    fn test_validation_kind() {
        assert_eq!(
            SyncError::validation("empty filename").kind(),
            ErrorKind::ValidationError
        );
    }
}
