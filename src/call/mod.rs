//! Retriable HTTP calls.
//!
//! A [`RetriableCall`] is one logical request plus a [`RetrySchedule`]. It is
//! driven through attempts by an [`AttemptExecutor`], normally a
//! [`CallDispatcher`], and reports exactly one [`CallResult`] to its
//! completion handler.
//!
//! # States
//!
//! ```text
//!            start             recoverable, retries left
//!   Ready ──────────▶ Dispatching ─────────────────────▶ WaitingToRetry
//!                       │    ▲                                │
//!   success / fatal /   │    └──────── timer fired ───────────┘
//!   retries exhausted   ▼
//!                   Completed ◀──── cancel (from any state)
//! ```
//!
//! `reset_retry` returns any non-terminal state to `Ready`.

mod dispatcher;
mod error;
mod retriable;
mod schedule;

#[cfg(test)]
mod test_fixtures;

pub use dispatcher::CallDispatcher;
pub use error::{CallError, MisuseError};
pub use retriable::{
    Attempt, AttemptExecutor, CallId, CallResult, CallState, CompletionHandler, RetriableCall,
};
pub use schedule::RetrySchedule;
