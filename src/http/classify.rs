//! Classification of a single attempt's result.
//!
//! The transport reports any status as a response; this is where a response
//! or transport failure is sorted into one of three classes before it is
//! handed to a [`RetriableCall`](crate::call::RetriableCall).
//!
//! | Result | Class |
//! |--------|-------|
//! | 2xx | [`AttemptOutcome::Success`] |
//! | connection failure, timeout | [`AttemptOutcome::Recoverable`] |
//! | 5xx, 408, 429 | [`AttemptOutcome::Recoverable`] |
//! | invalid URL | [`AttemptOutcome::Fatal`] |
//! | any other status | [`AttemptOutcome::Fatal`] |

use super::{AttemptError, HttpError, HttpResponse};

/// The classified result of one attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The server returned a usable (2xx) response.
    Success(HttpResponse),
    /// A transient failure; eligible for another attempt.
    Recoverable(AttemptError),
    /// A permanent failure; retrying would not help.
    Fatal(AttemptError),
}

impl AttemptOutcome {
    /// Returns a short label for logging.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Recoverable(_) => "recoverable",
            Self::Fatal(_) => "fatal",
        }
    }
}

/// Sorts a transport result into an [`AttemptOutcome`].
#[must_use]
pub fn classify(result: Result<HttpResponse, HttpError>) -> AttemptOutcome {
    let error = match result {
        Ok(response) if response.is_success() => return AttemptOutcome::Success(response),
        Ok(response) => AttemptError::Status {
            status: response.status,
            body: response.body_text().map(ToString::to_string),
        },
        Err(e) => AttemptError::Http(e),
    };

    if error.is_retryable() {
        AttemptOutcome::Recoverable(error)
    } else {
        AttemptOutcome::Fatal(error)
    }
}

/// Extension trait for checking if an error is retryable.
///
/// Determines whether an error represents a transient failure that
/// warrants a retry attempt.
pub trait IsRetryable {
    /// Returns true if the error is potentially transient and should be retried.
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for HttpError {
    fn is_retryable(&self) -> bool {
        match self {
            // Network errors are typically transient
            Self::Connection(_) | Self::Timeout => true,
            // URL errors are caller mistakes, not transient
            Self::InvalidUrl(_) => false,
        }
    }
}

impl IsRetryable for AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_retryable(),
            // 5xx, throttling (429) and request timeout (408) may go away;
            // every other status will come back the same
            Self::Status { status, .. } => {
                status.is_server_error()
                    || *status == http::StatusCode::TOO_MANY_REQUESTS
                    || *status == http::StatusCode::REQUEST_TIMEOUT
            }
        }
    }
}
