//! Error types for the GitHub backend.

use quire_remote::{RemoteError, RemoteErrorKind};

/// Backend identifier for error messages.
pub(crate) const BACKEND: &str = "GitHub";

/// Error from GitHub API operations.
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed")]
    HttpRequest(#[from] ureq::Error),

    /// HTTP response error (server returned error status).
    #[error("HTTP error: {status} - {body}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// File content was not valid base64.
    #[error("invalid base64 content")]
    Base64(#[from] base64::DecodeError),

    /// Response shape didn't match the request (e.g. a file where a
    /// directory listing was expected).
    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl GithubError {
    /// Semantic kind of this error.
    ///
    /// GitHub reports a stale or missing `sha` on writes as `409` or `422`,
    /// and a non-fast-forward ref update as `422`; both are conflicts.
    #[must_use]
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            Self::HttpRequest(_) => RemoteErrorKind::Network,
            Self::HttpResponse { status, body } => match status {
                401 | 403 => RemoteErrorKind::Unauthenticated,
                404 => RemoteErrorKind::NotFound,
                409 => RemoteErrorKind::Conflict,
                422 if body.contains("sha") || body.contains("fast forward") => {
                    RemoteErrorKind::Conflict
                }
                400 | 422 => RemoteErrorKind::Validation,
                _ => RemoteErrorKind::Other,
            },
            Self::Json(_) | Self::Base64(_) | Self::Unexpected(_) => RemoteErrorKind::Other,
        }
    }

    /// Convert into a [`RemoteError`] carrying `path` as context.
    #[must_use]
    pub fn into_remote(self, path: &str) -> RemoteError {
        let error = RemoteError::new(self.kind())
            .with_path(path)
            .with_backend(BACKEND);
        match self {
            Self::HttpResponse { status, body } => {
                error.with_message(format!("HTTP {status}: {}", summarize(&body)))
            }
            other => error.with_source(other),
        }
    }
}

/// Extract GitHub's `message` field from an error body, if present.
fn summarize(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message")?.as_str().map(str::to_owned))
        .unwrap_or_else(|| body.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> GithubError {
        GithubError::HttpResponse {
            status,
            body: body.to_owned(),
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(response(401, "").kind(), RemoteErrorKind::Unauthenticated);
        assert_eq!(response(403, "").kind(), RemoteErrorKind::Unauthenticated);
        assert_eq!(response(404, "").kind(), RemoteErrorKind::NotFound);
        assert_eq!(response(409, "").kind(), RemoteErrorKind::Conflict);
        assert_eq!(response(500, "").kind(), RemoteErrorKind::Other);
    }

    #[test]
    fn test_422_sha_is_conflict() {
        let err = response(422, r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied."}"#);

        assert_eq!(err.kind(), RemoteErrorKind::Conflict);
    }

    #[test]
    fn test_422_not_fast_forward_is_conflict() {
        let err = response(422, r#"{"message":"Update is not a fast forward"}"#);

        assert_eq!(err.kind(), RemoteErrorKind::Conflict);
    }

    #[test]
    fn test_422_other_is_validation() {
        let err = response(422, r#"{"message":"path contains a malformed segment"}"#);

        assert_eq!(err.kind(), RemoteErrorKind::Validation);
    }

    #[test]
    fn test_into_remote_uses_message_field() {
        let err = response(404, r#"{"message":"Not Found","documentation_url":"x"}"#)
            .into_remote("content/a.md");

        assert_eq!(err.kind(), RemoteErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            "[GitHub] Not found: HTTP 404: Not Found (path: content/a.md)"
        );
    }
}
