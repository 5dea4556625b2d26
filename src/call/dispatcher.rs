//! Dispatcher owning the transport and the table of live calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::{Attempt, AttemptExecutor, CallId, MisuseError, RetriableCall};
use crate::http::{AttemptOutcome, HttpClient, HttpRequest, classify};

/// Runs the attempts of [`RetriableCall`]s over an [`HttpClient`].
///
/// Every attempt runs on its own tokio task; the task's abort handle is
/// registered with the call so that cancelling the call also aborts the
/// network exchange. The dispatcher keeps a table of the calls it has started
/// (held weakly) so they can be cancelled by id.
///
/// Cloning is cheap and clones share the same transport and table.
///
/// # Type Parameters
///
/// - `H`: The HTTP client implementation
///
/// # Example
///
/// ```no_run
/// use retriable_call::call::{CallDispatcher, RetriableCall, RetrySchedule};
/// use retriable_call::http::{HttpRequest, ReqwestClient};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let dispatcher = CallDispatcher::new(ReqwestClient::new());
/// let request = HttpRequest::post(Url::parse("https://in.example.com/logs")?);
/// let call = RetriableCall::new(request, RetrySchedule::default(), |result| {
///     println!("settled: {:?}", result.map(|r| r.status));
/// });
///
/// dispatcher.send(&call)?;
/// dispatcher.cancel(call.id());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CallDispatcher<H> {
    shared: Arc<Shared<H>>,
}

#[derive(Debug)]
struct Shared<H> {
    client: H,
    calls: Mutex<HashMap<CallId, Weak<RetriableCall>>>,
}

impl<H> Clone for CallDispatcher<H> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<H: HttpClient + 'static> CallDispatcher<H> {
    /// Creates a dispatcher over the given transport.
    #[must_use]
    pub fn new(client: H) -> Self {
        Self {
            shared: Arc::new(Shared {
                client,
                calls: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn client(&self) -> &H {
        &self.shared.client
    }

    /// Registers `call` and starts its first attempt.
    ///
    /// Entries of calls that settled or were dropped since the last send are
    /// pruned first, including calls cancelled directly on the call.
    ///
    /// # Errors
    ///
    /// Returns [`MisuseError::NoRuntime`] outside a tokio runtime, or the
    /// error from [`RetriableCall::start`] if the call is not ready.
    pub fn send(&self, call: &Arc<RetriableCall>) -> Result<(), MisuseError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(MisuseError::NoRuntime);
        }

        let newly_registered = {
            let mut calls = self.calls();
            prune(&mut calls);
            calls.insert(call.id(), Arc::downgrade(call)).is_none()
        };

        let executor: Arc<dyn AttemptExecutor> = Arc::new(self.clone());
        if let Err(e) = call.start(executor) {
            if newly_registered {
                self.forget(call.id());
            }
            return Err(e);
        }
        Ok(())
    }

    /// Sends one attempt of `request` and classifies the result.
    pub async fn execute(&self, request: &HttpRequest) -> AttemptOutcome {
        classify(self.shared.client.request(request.clone()).await)
    }

    /// Cancels the call registered under `id`.
    ///
    /// Returns true if a live call was found and this cancellation settled it.
    pub fn cancel(&self, id: CallId) -> bool {
        let call = self.calls().remove(&id).and_then(|call| call.upgrade());
        call.is_some_and(|call| call.cancel())
    }

    /// Cancels every registered call and returns how many were settled.
    pub fn cancel_all(&self) -> usize {
        let calls: Vec<_> = self
            .calls()
            .drain()
            .filter_map(|(_, call)| call.upgrade())
            .collect();

        let cancelled = calls.iter().filter(|call| call.cancel()).count();
        if cancelled > 0 {
            tracing::info!("Cancelled {cancelled} pending call(s)");
        }
        cancelled
    }

    /// Returns the number of registered calls that have not settled.
    ///
    /// Settled and dropped calls are pruned from the table.
    pub fn in_flight(&self) -> usize {
        let mut calls = self.calls();
        prune(&mut calls);
        calls.len()
    }

    /// Returns true if a call with `id` is registered.
    pub fn contains(&self, id: CallId) -> bool {
        self.calls().contains_key(&id)
    }

    fn forget(&self, id: CallId) {
        self.calls().remove(&id);
    }

    fn calls(&self) -> MutexGuard<'_, HashMap<CallId, Weak<RetriableCall>>> {
        self.shared
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drops table entries whose call has settled or been dropped.
fn prune(calls: &mut HashMap<CallId, Weak<RetriableCall>>) {
    calls.retain(|_, call| call.upgrade().is_some_and(|call| !call.is_completed()));
}

impl<H: HttpClient + 'static> AttemptExecutor for CallDispatcher<H> {
    fn start_attempt(&self, call: Arc<RetriableCall>, attempt: Attempt) {
        let dispatcher = self.clone();
        let task_call = Arc::clone(&call);

        let task = tokio::spawn(async move {
            let outcome = dispatcher.execute(task_call.request()).await;
            tracing::debug!(
                "Call {} attempt {} returned {}",
                task_call.id(),
                attempt.number(),
                outcome.label()
            );

            task_call.complete_attempt(attempt, outcome);
            if task_call.is_completed() {
                dispatcher.forget(task_call.id());
            }
        });

        call.track_in_flight(attempt, task.abort_handle());
    }
}
