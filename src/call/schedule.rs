//! Retry schedule.

use std::fmt;
use std::time::Duration;

/// Ordered delays between attempts of a [`RetriableCall`](super::RetriableCall).
///
/// Entry `i` is the wait before retry `i + 1`, so a schedule of length `n`
/// allows `n + 1` attempts in total. An empty schedule means the initial
/// attempt is the only one.
///
/// The schedule carries no backoff formula; callers supply the delays.
///
/// # Defaults
///
/// 10 seconds, 5 minutes, 20 minutes.
///
/// # Example
///
/// ```
/// use retriable_call::call::RetrySchedule;
/// use std::time::Duration;
///
/// let schedule = RetrySchedule::new([Duration::from_secs(1), Duration::from_secs(5)]);
/// assert_eq!(schedule.max_attempts(), 3);
/// assert_eq!(schedule.delay_for_retry(1), Some(Duration::from_secs(5)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySchedule {
    delays: Vec<Duration>,
}

impl RetrySchedule {
    /// Default retry intervals, in seconds.
    pub const DEFAULT_INTERVALS_SECS: [u64; 3] = [10, 5 * 60, 20 * 60];

    /// Creates a schedule from an ordered sequence of delays.
    #[must_use]
    pub fn new(delays: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            delays: delays.into_iter().collect(),
        }
    }

    /// Creates a schedule that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self { delays: Vec::new() }
    }

    /// Creates a schedule from whole-second delays.
    #[must_use]
    pub fn from_secs(secs: &[u64]) -> Self {
        Self::new(secs.iter().copied().map(Duration::from_secs))
    }

    /// Returns the number of retries the schedule allows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.delays.len()
    }

    /// Returns true if the schedule allows no retries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    /// Returns the total number of attempts: the initial one plus every retry.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        u32::try_from(self.delays.len())
            .unwrap_or(u32::MAX)
            .saturating_add(1)
    }

    /// Returns the delay before retry `retry` (0 = first retry).
    #[must_use]
    pub fn delay_for_retry(&self, retry: usize) -> Option<Duration> {
        self.delays.get(retry).copied()
    }

    /// Returns the wait after attempt `attempt` (1-based) before the next one.
    ///
    /// `None` once the attempt was the last the schedule allows.
    #[must_use]
    pub fn delay_after_attempt(&self, attempt: u32) -> Option<Duration> {
        let retry = usize::try_from(attempt.checked_sub(1)?).ok()?;
        self.delay_for_retry(retry)
    }

    /// Returns all delays in order.
    #[must_use]
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Returns the sum of all delays, saturating at [`Duration::MAX`].
    #[must_use]
    pub fn total_delay(&self) -> Duration {
        self.delays
            .iter()
            .fold(Duration::ZERO, |total, delay| total.saturating_add(*delay))
    }
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self::from_secs(&Self::DEFAULT_INTERVALS_SECS)
    }
}

impl fmt::Display for RetrySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.delays.is_empty() {
            return f.write_str("no retries");
        }
        for (i, delay) in self.delays.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{delay:?}")?;
        }
        Ok(())
    }
}
