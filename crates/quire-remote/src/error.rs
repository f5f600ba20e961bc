//! Remote error types.
//!
//! Provides [`RemoteError`] for unified error handling across Remote Content
//! API backends. The [`RemoteErrorKind`] is preserved as errors travel up
//! through the sync layer, so callers can branch on "not found" versus
//! "conflict" without knowing which backend produced the error.

use std::fmt;

/// Semantic error categories for remote content operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RemoteErrorKind {
    /// Path does not exist (or the version token is stale).
    NotFound,
    /// Version token or branch head mismatch.
    Conflict,
    /// Credentials missing, expired, or lacking permission.
    Unauthenticated,
    /// Transport failure (DNS, connection reset, timeout).
    Network,
    /// Request rejected as malformed (invalid path, empty content name).
    Validation,
    /// Other/unknown error category.
    Other,
}

impl RemoteErrorKind {
    fn label(self) -> &'static str {
        match self {
            Self::NotFound => "Not found",
            Self::Conflict => "Conflict",
            Self::Unauthenticated => "Unauthenticated",
            Self::Network => "Network error",
            Self::Validation => "Invalid request",
            Self::Other => "Error",
        }
    }
}

/// Remote error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct RemoteError {
    kind: RemoteErrorKind,
    path: Option<String>,
    backend: Option<&'static str>,
    message: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RemoteError {
    /// Create a new remote error.
    #[must_use]
    pub fn new(kind: RemoteErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            message: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach a human-readable detail (e.g., a server response body).
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Semantic error category.
    #[must_use]
    pub fn kind(&self) -> RemoteErrorKind {
        self.kind
    }

    /// Path context, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Backend identifier, if any.
    #[must_use]
    pub fn backend(&self) -> Option<&'static str> {
        self.backend
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound).with_path(path)
    }

    /// Create a conflict error with path.
    #[must_use]
    pub fn conflict(path: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Conflict).with_path(path)
    }

    /// Returns `true` if this is a [`RemoteErrorKind::NotFound`] error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == RemoteErrorKind::NotFound
    }

    /// Returns `true` if this is a [`RemoteErrorKind::Conflict`] error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.kind == RemoteErrorKind::Conflict
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "[Backend] Kind: message: source (path: foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        write!(f, "{}", self.kind.label())?;

        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {path})")?;
        }

        Ok(())
    }
}

impl std::error::Error for RemoteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_new() {
        let err = RemoteError::new(RemoteErrorKind::NotFound);

        assert_eq!(err.kind(), RemoteErrorKind::NotFound);
        assert!(err.path().is_none());
        assert!(err.backend().is_none());
    }

    #[test]
    fn test_remote_error_helpers() {
        let err = RemoteError::not_found("posts/a.md");
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
        assert_eq!(err.path(), Some("posts/a.md"));

        let err = RemoteError::conflict("posts/a.md");
        assert!(err.is_conflict());
    }

    #[test]
    fn test_remote_error_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = RemoteError::new(RemoteErrorKind::Network).with_source(io_err);

        assert!(err.downcast_source::<std::io::Error>().is_some());
    }

    #[test]
    fn test_remote_error_display_simple() {
        let err = RemoteError::new(RemoteErrorKind::Conflict);

        assert_eq!(err.to_string(), "Conflict");
    }

    #[test]
    fn test_remote_error_display_full() {
        let err = RemoteError::new(RemoteErrorKind::NotFound)
            .with_backend("GitHub")
            .with_message("404")
            .with_path("posts/a.md");

        assert_eq!(err.to_string(), "[GitHub] Not found: 404 (path: posts/a.md)");
    }

    #[test]
    fn test_remote_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RemoteError>();
    }
}
