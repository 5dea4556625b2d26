//! One-shot cancellable delay.
//!
//! [`RetryTimer`] arms a callback on the tokio timer instead of blocking a
//! thread. Cancelling or dropping the timer aborts the waiting task, so the
//! callback never runs afterwards unless it was already running.
//!
//! Abort alone cannot stop a callback that has already started. Callers that
//! need a strict no-late-fire guarantee pair the timer with a generation
//! check under their own lock, as [`RetriableCall`](crate::call::RetriableCall)
//! does.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::Instant;

/// Stand-in deadline for delays too large to add to the current instant.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A single-shot timer running on the tokio runtime.
///
/// The timer uses [`tokio::time`], so tests can drive it with a paused clock.
///
/// # Example
///
/// ```
/// use retriable_call::timer::RetryTimer;
/// use std::time::Duration;
/// use tokio::runtime::Handle;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let timer = RetryTimer::arm(&Handle::current(), Duration::from_secs(60), || println!("fired"));
/// timer.cancel(); // never prints
/// # }
/// ```
#[derive(Debug)]
pub struct RetryTimer {
    handle: AbortHandle,
    deadline: Instant,
}

impl RetryTimer {
    /// Arms a timer on `runtime` that runs `on_fire` once `delay` has elapsed.
    ///
    /// Taking the handle explicitly lets the timer be armed from threads that
    /// are not inside the runtime. A delay too large to represent as an
    /// instant waits for roughly thirty years instead.
    #[must_use = "dropping the timer cancels it"]
    pub fn arm<F>(runtime: &Handle, delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let now = Instant::now();
        let deadline = now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE);
        let handle = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            on_fire();
        })
        .abort_handle();

        Self { handle, deadline }
    }

    /// Returns the instant at which the timer fires.
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns the time left before the timer fires.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Returns true once the timer task has finished or been aborted.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancels the timer.
    ///
    /// Equivalent to dropping it.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for RetryTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
