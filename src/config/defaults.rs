//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

use crate::call::RetrySchedule;

/// Default HTTP method.
pub const METHOD: &str = "POST";

/// Default per-attempt timeout in seconds.
pub const TIMEOUT_SECS: u64 = 30;

/// Default delays before each retry, in seconds: 10s, 5min, 20min.
pub const RETRY_INTERVALS_SECS: [u64; 3] = RetrySchedule::DEFAULT_INTERVALS_SECS;

/// Upper bound accepted for a single retry interval, in seconds (one day).
pub const RETRY_INTERVAL_MAX_SECS: u64 = 24 * 60 * 60;

/// Default per-attempt timeout as Duration.
#[must_use]
pub const fn timeout() -> Duration {
    Duration::from_secs(TIMEOUT_SECS)
}
