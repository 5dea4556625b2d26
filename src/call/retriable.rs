//! The retriable call state machine.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use super::{CallError, MisuseError, RetrySchedule};
use crate::http::{AttemptOutcome, HttpRequest, HttpResponse};
use crate::timer::RetryTimer;

/// The single terminal result of a [`RetriableCall`].
pub type CallResult = Result<HttpResponse, CallError>;

/// Single-use callback receiving a call's [`CallResult`].
pub type CompletionHandler = Box<dyn FnOnce(CallResult) + Send + 'static>;

static NEXT_CALL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`RetriableCall`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(u64);

impl CallId {
    fn next() -> Self {
        Self(NEXT_CALL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Observable state of a [`RetriableCall`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Constructed or reset; no attempt in flight.
    Ready,
    /// An attempt has been handed to the executor and has not reported back.
    Dispatching,
    /// A recoverable failure was seen; the retry timer is armed.
    WaitingToRetry,
    /// The completion handler has been (or is being) invoked.
    Completed,
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ready => "ready",
            Self::Dispatching => "dispatching",
            Self::WaitingToRetry => "waiting to retry",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Token identifying one attempt of a call.
///
/// Executors hand it back with the attempt's outcome. Tokens from attempts
/// that were superseded by a reset, a cancellation or a settlement are
/// recognised as stale and their outcomes discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    number: u32,
    epoch: u64,
}

impl Attempt {
    /// Returns the 1-based attempt number.
    #[must_use]
    pub const fn number(self) -> u32 {
        self.number
    }
}

/// Runs attempts on behalf of a [`RetriableCall`].
///
/// # Contract
///
/// `start_attempt` must not block: it starts the attempt on its own execution
/// context and returns. When the attempt finishes, the executor reports back
/// through [`RetriableCall::complete_attempt`] with the same [`Attempt`].
/// Executors that can abort the attempt register the handle with
/// [`RetriableCall::track_in_flight`] so cancellation reaches the network
/// exchange.
pub trait AttemptExecutor: Send + Sync {
    /// Starts one attempt of `call`.
    fn start_attempt(&self, call: Arc<RetriableCall>, attempt: Attempt);
}

/// Internal phase; each variant owns exactly the resources valid in it.
///
/// `runtime` is the runtime the call was started on. Retry timers are armed
/// there, whichever thread reports the outcome.
enum Phase {
    Ready,
    Dispatching {
        executor: Arc<dyn AttemptExecutor>,
        runtime: Handle,
        in_flight: Option<AbortHandle>,
    },
    WaitingToRetry {
        executor: Arc<dyn AttemptExecutor>,
        runtime: Handle,
        timer: RetryTimer,
    },
    Completed,
}

impl Phase {
    const fn state(&self) -> CallState {
        match self {
            Self::Ready => CallState::Ready,
            Self::Dispatching { .. } => CallState::Dispatching,
            Self::WaitingToRetry { .. } => CallState::WaitingToRetry,
            Self::Completed => CallState::Completed,
        }
    }

    /// Releases the phase's resources: aborts the attempt, cancels the timer.
    fn retire(self) {
        match self {
            Self::Dispatching {
                in_flight: Some(handle),
                ..
            } => handle.abort(),
            Self::WaitingToRetry { timer, .. } => timer.cancel(),
            _ => {}
        }
    }
}

struct CallInner {
    phase: Phase,
    attempt_count: u32,
    /// Bumped on every dispatch, reset, cancellation and settlement.
    epoch: u64,
    completion: Option<CompletionHandler>,
}

impl CallInner {
    fn begin_attempt(&mut self, executor: Arc<dyn AttemptExecutor>, runtime: Handle) -> Attempt {
        self.attempt_count += 1;
        self.epoch = self.epoch.wrapping_add(1);
        self.phase = Phase::Dispatching {
            executor,
            runtime,
            in_flight: None,
        };
        Attempt {
            number: self.attempt_count,
            epoch: self.epoch,
        }
    }

    fn settle(&mut self, result: CallResult) -> Option<Settlement> {
        self.epoch = self.epoch.wrapping_add(1);
        std::mem::replace(&mut self.phase, Phase::Completed).retire();
        self.completion
            .take()
            .map(|handler| Settlement { handler, result })
    }
}

/// A settled result waiting to be delivered outside the lock.
struct Settlement {
    handler: CompletionHandler,
    result: CallResult,
}

impl Settlement {
    fn deliver(self) {
        (self.handler)(self.result);
    }
}

/// One logical HTTP request with automatic retries.
///
/// The call owns an immutable [`HttpRequest`] and [`RetrySchedule`]. Each
/// attempt is run by an [`AttemptExecutor`]; recoverable failures arm a
/// [`RetryTimer`] for the next scheduled delay, and every path ends by
/// invoking the completion handler exactly once.
///
/// All transitions are serialized by a per-call lock. The completion handler
/// and the executor are always invoked with the lock released, so either may
/// call back into the call.
///
/// # Example
///
/// ```no_run
/// use retriable_call::call::{CallDispatcher, RetriableCall, RetrySchedule};
/// use retriable_call::http::ReqwestClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let dispatcher = CallDispatcher::new(ReqwestClient::new());
/// let (tx, rx) = tokio::sync::oneshot::channel();
///
/// let call = RetriableCall::from_parts(
///     "https://in.example.com/logs",
///     "POST",
///     None,
///     Some(b"{}".to_vec()),
///     RetrySchedule::default(),
///     move |result| {
///         let _ = tx.send(result);
///     },
/// )?;
/// dispatcher.send(&call)?;
///
/// let response = rx.await??;
/// println!("delivered: {}", response.status);
/// # Ok(())
/// # }
/// ```
pub struct RetriableCall {
    id: CallId,
    request: HttpRequest,
    schedule: RetrySchedule,
    inner: Mutex<CallInner>,
}

impl RetriableCall {
    /// Creates a call in state [`CallState::Ready`] with no attempts made.
    #[must_use]
    pub fn new<F>(request: HttpRequest, schedule: RetrySchedule, on_complete: F) -> Arc<Self>
    where
        F: FnOnce(CallResult) + Send + 'static,
    {
        Arc::new(Self {
            id: CallId::next(),
            request,
            schedule,
            inner: Mutex::new(CallInner {
                phase: Phase::Ready,
                attempt_count: 0,
                epoch: 0,
                completion: Some(Box::new(on_complete)),
            }),
        })
    }

    /// Creates a call from plain request parts.
    ///
    /// # Errors
    ///
    /// Returns [`MisuseError::InvalidUrl`] if `url` is not an absolute
    /// http/https URL, or [`MisuseError::InvalidMethod`] if `method` is not a
    /// supported verb.
    pub fn from_parts<F>(
        url: &str,
        method: &str,
        headers: Option<http::HeaderMap>,
        body: Option<Vec<u8>>,
        schedule: RetrySchedule,
        on_complete: F,
    ) -> Result<Arc<Self>, MisuseError>
    where
        F: FnOnce(CallResult) + Send + 'static,
    {
        let url = HttpRequest::parse_url(url).map_err(|reason| MisuseError::InvalidUrl {
            url: url.to_string(),
            reason,
        })?;
        let method = HttpRequest::parse_method(method)
            .ok_or_else(|| MisuseError::InvalidMethod(method.to_string()))?;

        let mut request = HttpRequest::new(method, url);
        if let Some(headers) = headers {
            request = request.with_headers(headers);
        }
        request.body = body;

        Ok(Self::new(request, schedule, on_complete))
    }

    /// Returns the call's identity.
    #[must_use]
    pub const fn id(&self) -> CallId {
        self.id
    }

    /// Returns the request sent on every attempt.
    #[must_use]
    pub const fn request(&self) -> &HttpRequest {
        &self.request
    }

    /// Returns the retry schedule.
    #[must_use]
    pub const fn schedule(&self) -> &RetrySchedule {
        &self.schedule
    }

    /// Returns the number of attempts started, including the first.
    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.lock().attempt_count
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> CallState {
        self.lock().phase.state()
    }

    /// Returns true once the call has settled.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state() == CallState::Completed
    }

    /// Returns true once the initial attempt and every scheduled retry have
    /// been used.
    #[must_use]
    pub fn has_reached_max_retries(&self) -> bool {
        self.lock().attempt_count >= self.schedule.max_attempts()
    }

    /// Starts the first attempt on `executor`.
    ///
    /// # Errors
    ///
    /// Returns [`MisuseError::AlreadyCompleted`] if the call has settled,
    /// [`MisuseError::NotReady`] if an attempt sequence is already running, or
    /// [`MisuseError::NoRuntime`] if called outside a tokio runtime. The call
    /// is left untouched in every case.
    pub fn start(self: &Arc<Self>, executor: Arc<dyn AttemptExecutor>) -> Result<(), MisuseError> {
        let attempt = {
            let mut inner = self.lock();
            match inner.phase {
                Phase::Ready => {}
                Phase::Completed => return Err(MisuseError::AlreadyCompleted),
                ref other => {
                    return Err(MisuseError::NotReady {
                        state: other.state(),
                    });
                }
            }
            let runtime = Handle::try_current().map_err(|_| MisuseError::NoRuntime)?;
            inner.begin_attempt(Arc::clone(&executor), runtime)
        };

        tracing::debug!(
            "Call {} starting attempt {}: {} {}",
            self.id,
            attempt.number,
            self.request.method,
            self.request.url
        );
        executor.start_attempt(Arc::clone(self), attempt);
        Ok(())
    }

    /// Records the outcome of `attempt` and moves the call on.
    ///
    /// Success and fatal errors settle the call. A recoverable error arms the
    /// retry timer if the schedule has delays left, and otherwise settles the
    /// call with [`CallError::RetriesExhausted`]. Outcomes of stale attempts
    /// are discarded.
    pub fn complete_attempt(self: &Arc<Self>, attempt: Attempt, outcome: AttemptOutcome) {
        let settlement = {
            let mut inner = self.lock();
            let epoch = inner.epoch;
            let (executor, runtime) = match &mut inner.phase {
                Phase::Dispatching {
                    executor,
                    runtime,
                    in_flight,
                } if epoch == attempt.epoch => {
                    // The reporting task is the one in flight; settling must not abort it.
                    in_flight.take();
                    (Arc::clone(executor), runtime.clone())
                }
                _ => {
                    tracing::debug!(
                        "Call {} discarding {} outcome of stale attempt {}",
                        self.id,
                        outcome.label(),
                        attempt.number
                    );
                    return;
                }
            };

            let attempts = inner.attempt_count;
            match outcome {
                AttemptOutcome::Success(response) => {
                    tracing::info!(
                        "Call {} succeeded with {} on attempt {attempts}",
                        self.id,
                        response.status
                    );
                    inner.settle(Ok(response))
                }
                AttemptOutcome::Fatal(source) => {
                    tracing::error!(
                        "Call {} failed on attempt {attempts}, not retrying: {source}",
                        self.id
                    );
                    inner.settle(Err(CallError::Fatal { attempts, source }))
                }
                AttemptOutcome::Recoverable(error) => {
                    match self.schedule.delay_after_attempt(attempts) {
                        Some(delay) => {
                            tracing::warn!(
                                "Call {} attempt {attempts} failed ({error}), retrying in {delay:?}",
                                self.id
                            );
                            let timer = self.arm_retry_timer(&runtime, delay, epoch);
                            inner.phase = Phase::WaitingToRetry {
                                executor,
                                runtime,
                                timer,
                            };
                            None
                        }
                        None => {
                            tracing::error!(
                                "Call {} giving up after {attempts} attempt(s): {error}",
                                self.id
                            );
                            inner.settle(Err(CallError::RetriesExhausted {
                                attempts,
                                last_error: error,
                            }))
                        }
                    }
                }
            }
        };

        if let Some(settlement) = settlement {
            settlement.deliver();
        }
    }

    /// Registers the abort handle of the task running `attempt`.
    ///
    /// If the attempt has already been superseded by a reset or cancellation,
    /// the task is aborted instead.
    pub fn track_in_flight(&self, attempt: Attempt, handle: AbortHandle) {
        let mut inner = self.lock();
        if inner.epoch != attempt.epoch {
            handle.abort();
            return;
        }
        if let Phase::Dispatching { in_flight, .. } = &mut inner.phase {
            *in_flight = Some(handle);
        }
    }

    /// Cancels the call.
    ///
    /// Invalidates the retry timer, aborts the in-flight attempt and settles
    /// with [`CallError::Cancelled`]. Returns `false` without doing anything
    /// if the call had already settled, so repeated calls are harmless.
    pub fn cancel(&self) -> bool {
        let settlement = {
            let mut inner = self.lock();
            if matches!(inner.phase, Phase::Completed) {
                return false;
            }
            inner.settle(Err(CallError::Cancelled))
        };

        tracing::info!("Call {} cancelled", self.id);
        if let Some(settlement) = settlement {
            settlement.deliver();
        }
        true
    }

    /// Stops the current attempt sequence and rewinds the call to
    /// [`CallState::Ready`] with the full schedule available again.
    ///
    /// The pending timer is invalidated and any in-flight attempt aborted.
    /// The completion handler is not invoked.
    ///
    /// # Errors
    ///
    /// Returns [`MisuseError::AlreadyCompleted`] if the call has settled; the
    /// call is left untouched.
    pub fn reset_retry(&self) -> Result<(), MisuseError> {
        let mut inner = self.lock();
        if matches!(inner.phase, Phase::Completed) {
            return Err(MisuseError::AlreadyCompleted);
        }

        inner.epoch = inner.epoch.wrapping_add(1);
        std::mem::replace(&mut inner.phase, Phase::Ready).retire();
        inner.attempt_count = 0;
        tracing::debug!("Call {} reset", self.id);
        Ok(())
    }

    fn arm_retry_timer(
        self: &Arc<Self>,
        runtime: &Handle,
        delay: std::time::Duration,
        epoch: u64,
    ) -> RetryTimer {
        let call = Arc::downgrade(self);
        RetryTimer::arm(runtime, delay, move || {
            if let Some(call) = call.upgrade() {
                call.retry_timer_fired(epoch);
            }
        })
    }

    fn retry_timer_fired(self: &Arc<Self>, epoch: u64) {
        let (executor, attempt) = {
            let mut inner = self.lock();
            let current = inner.epoch;
            let (executor, runtime) = match &inner.phase {
                Phase::WaitingToRetry {
                    executor, runtime, ..
                } if current == epoch => (Arc::clone(executor), runtime.clone()),
                _ => {
                    tracing::debug!("Call {} ignoring stale retry timer", self.id);
                    return;
                }
            };
            let attempt = inner.begin_attempt(Arc::clone(&executor), runtime);
            (executor, attempt)
        };

        tracing::debug!("Call {} starting attempt {}", self.id, attempt.number);
        executor.start_attempt(Arc::clone(self), attempt);
    }

    fn lock(&self) -> MutexGuard<'_, CallInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for RetriableCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("RetriableCall")
            .field("id", &self.id)
            .field("method", &self.request.method)
            .field("url", &self.request.url.as_str())
            .field("schedule", &self.schedule)
            .field("state", &inner.phase.state())
            .field("attempt_count", &inner.attempt_count)
            .finish_non_exhaustive()
    }
}
