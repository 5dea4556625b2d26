//! Error types for a single HTTP attempt.

use thiserror::Error;

/// Error type for transport operations.
///
/// Describes what went wrong without dictating recovery strategy.
/// Whether a failure is retried is decided by [`classify`](super::classify).
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// and other network-level errors.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    ///
    /// The server did not respond within the configured timeout period.
    #[error("Request timed out")]
    Timeout,

    /// The provided URL is invalid.
    ///
    /// This typically indicates a caller error rather than
    /// a transient failure.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Why one attempt did not produce a usable response.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// The transport itself failed.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The server answered with a non-success status.
    #[error("Server returned {status}{}", body_suffix(.body.as_deref()))]
    Status {
        /// HTTP status code
        status: http::StatusCode,
        /// Response body, if it was valid UTF-8
        body: Option<String>,
    },
}

impl AttemptError {
    /// Returns the HTTP status, if the server answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(_) => None,
        }
    }
}

fn body_suffix(body: Option<&str>) -> String {
    match body {
        Some(text) if !text.is_empty() => format!(": {text}"),
        _ => String::new(),
    }
}
