//! Shared fixtures for call tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::Instant;

use super::{Attempt, AttemptExecutor, CallResult, RetriableCall, RetrySchedule};
use crate::http::{AttemptError, AttemptOutcome, HttpRequest, HttpResponse};

/// Executor that answers each attempt with the next scripted outcome.
#[derive(Debug)]
pub struct ScriptedExecutor {
    outcomes: Mutex<VecDeque<AttemptOutcome>>,
    started: Mutex<Vec<(u32, Instant)>>,
    latency: Duration,
}

impl ScriptedExecutor {
    pub fn new(outcomes: Vec<AttemptOutcome>) -> Arc<Self> {
        Self::with_latency(outcomes, Duration::ZERO)
    }

    pub fn with_latency(outcomes: Vec<AttemptOutcome>, latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            started: Mutex::new(Vec::new()),
            latency,
        })
    }

    /// Number of attempts started.
    pub fn calls(&self) -> usize {
        self.started.lock().unwrap().len()
    }

    /// Attempt numbers in the order they were started.
    pub fn attempt_numbers(&self) -> Vec<u32> {
        self.started.lock().unwrap().iter().map(|(n, _)| *n).collect()
    }

    /// Clock readings at which each attempt was started.
    pub fn start_times(&self) -> Vec<Instant> {
        self.started.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

impl AttemptExecutor for ScriptedExecutor {
    fn start_attempt(&self, call: Arc<RetriableCall>, attempt: Attempt) {
        self.started
            .lock()
            .unwrap()
            .push((attempt.number(), Instant::now()));
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted outcome left");

        let latency = self.latency;
        let task_call = Arc::clone(&call);
        let task = tokio::spawn(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            task_call.complete_attempt(attempt, outcome);
        });
        call.track_in_flight(attempt, task.abort_handle());
    }
}

/// Executor that only records attempts; tests complete them by hand.
#[derive(Debug, Default)]
pub struct ManualExecutor {
    attempts: Mutex<Vec<Attempt>>,
}

impl ManualExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn last(&self) -> Attempt {
        *self.attempts.lock().unwrap().last().expect("no attempt started")
    }
}

impl AttemptExecutor for ManualExecutor {
    fn start_attempt(&self, _call: Arc<RetriableCall>, attempt: Attempt) {
        self.attempts.lock().unwrap().push(attempt);
    }
}

/// Receiving end of a completion handler.
#[derive(Debug)]
pub struct Completions {
    rx: mpsc::UnboundedReceiver<CallResult>,
}

impl Completions {
    /// Waits for the handler to fire.
    pub async fn next(&mut self) -> CallResult {
        self.rx
            .recv()
            .await
            .expect("handler dropped without firing")
    }

    /// Asserts the handler has not fired yet and is still held by the call.
    pub fn assert_pending(&mut self) {
        assert!(matches!(self.rx.try_recv(), Err(TryRecvError::Empty)));
    }

    /// Asserts the handler was consumed and nothing else is queued.
    pub fn assert_done(&mut self) {
        assert!(matches!(
            self.rx.try_recv(),
            Err(TryRecvError::Disconnected)
        ));
    }
}

pub fn completion_channel() -> (impl FnOnce(CallResult) + Send + 'static, Completions) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler = move |result| {
        let _ = tx.send(result);
    };
    (handler, Completions { rx })
}

pub fn test_request() -> HttpRequest {
    HttpRequest::post(url::Url::parse("https://in.example.com/logs").unwrap())
        .with_header(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        )
        .with_body(br#"{"logs":[]}"#.to_vec())
}

pub fn make_call(schedule: RetrySchedule) -> (Arc<RetriableCall>, Completions) {
    let (handler, completions) = completion_channel();
    (
        RetriableCall::new(test_request(), schedule, handler),
        completions,
    )
}

pub fn secs(delays: &[u64]) -> RetrySchedule {
    RetrySchedule::from_secs(delays)
}

pub fn success() -> AttemptOutcome {
    AttemptOutcome::Success(HttpResponse::new(
        http::StatusCode::OK,
        http::HeaderMap::new(),
        b"accepted".to_vec(),
    ))
}

pub fn recoverable() -> AttemptOutcome {
    recoverable_status(http::StatusCode::SERVICE_UNAVAILABLE)
}

pub fn recoverable_status(status: http::StatusCode) -> AttemptOutcome {
    AttemptOutcome::Recoverable(AttemptError::Status { status, body: None })
}

pub fn fatal() -> AttemptOutcome {
    AttemptOutcome::Fatal(AttemptError::Status {
        status: http::StatusCode::BAD_REQUEST,
        body: Some("malformed".to_string()),
    })
}

/// Sleeps until `ms` milliseconds after `start` on the (paused) clock.
pub async fn at(start: Instant, ms: u64) {
    tokio::time::sleep_until(start + Duration::from_millis(ms)).await;
}
