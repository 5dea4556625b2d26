//! Error types for retriable calls.

use thiserror::Error;

use super::CallState;
use crate::http::AttemptError;

/// Terminal failure of a [`RetriableCall`](super::RetriableCall).
///
/// Exactly one of these, or a successful response, reaches the completion
/// handler.
#[derive(Debug, Error)]
pub enum CallError {
    /// An attempt failed in a way retrying would not fix.
    #[error("Request failed on attempt {attempts}: {source}")]
    Fatal {
        /// Attempts made, including the failing one
        attempts: u32,
        /// The error returned by the failing attempt
        #[source]
        source: AttemptError,
    },

    /// Every attempt failed with a recoverable error and the schedule ran out.
    #[error("Request failed after {attempts} attempt(s): {last_error}")]
    RetriesExhausted {
        /// Total number of attempts made
        attempts: u32,
        /// The error from the final attempt
        #[source]
        last_error: AttemptError,
    },

    /// The call was cancelled before reaching another terminal outcome.
    #[error("Request was cancelled")]
    Cancelled,
}

impl CallError {
    /// Returns true if the call was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true if the call ran out of retries.
    #[must_use]
    pub const fn is_retries_exhausted(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }

    /// Returns true if the call hit a non-recoverable error.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }

    /// Returns the number of attempts made, if the call failed on an attempt.
    #[must_use]
    pub const fn attempts(&self) -> Option<u32> {
        match self {
            Self::Fatal { attempts, .. } | Self::RetriesExhausted { attempts, .. } => {
                Some(*attempts)
            }
            Self::Cancelled => None,
        }
    }
}

/// A retriable call was used incorrectly.
///
/// These are reported to the caller instead of being ignored, and never
/// settle the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MisuseError {
    /// The endpoint is not an absolute http/https URL.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL string
        url: String,
        /// Reason for rejection
        reason: String,
    },

    /// The HTTP method is not one of the supported verbs.
    #[error("Invalid HTTP method '{0}'")]
    InvalidMethod(String),

    /// The call can only be started from `Ready`.
    #[error("Call cannot be started while {state}")]
    NotReady {
        /// State the call was in
        state: CallState,
    },

    /// The call has already settled.
    #[error("Call has already completed")]
    AlreadyCompleted,

    /// Dispatching requires a tokio runtime on the current thread.
    #[error("No tokio runtime available to dispatch the call")]
    NoRuntime,
}
