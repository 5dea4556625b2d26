//! Application execution logic.
//!
//! This module sends the configured request as one retriable call and waits
//! for it to settle, cancelling it if a shutdown signal arrives first.

use std::future::Future;

use thiserror::Error;
use tokio::signal;
use tokio::sync::oneshot;

use retriable_call::call::{CallDispatcher, CallError, MisuseError, RetriableCall, RetrySchedule};
use retriable_call::config::ValidatedConfig;
use retriable_call::http::{HttpClient, HttpRequest, HttpResponse, ReqwestClient};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to build the HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The call could not be handed to the dispatcher.
    #[error("Failed to dispatch call: {0}")]
    Dispatch(#[from] MisuseError),

    /// The call settled with an error.
    #[error("Delivery failed: {0}")]
    Call(#[from] CallError),

    /// The call went away without invoking its completion handler.
    #[error("Call was dropped without reporting a result")]
    CompletionLost,
}

impl RunError {
    /// Returns true if the call was cancelled by a shutdown signal.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Call(CallError::Cancelled))
    }
}

/// Sends the configured request and waits for the final result.
///
/// # Errors
///
/// Returns an error if:
/// - The HTTP client cannot be built
/// - The call fails fatally, exhausts its retries, or is cancelled by
///   Ctrl+C / SIGTERM
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires a real
/// network and signal handling.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<HttpResponse, RunError> {
    let client = build_client(&config)?;
    let dispatcher = CallDispatcher::new(client);

    tracing::info!(
        "Sending {} {} (retries: {})",
        config.method,
        config.url,
        config.schedule
    );

    deliver(
        &dispatcher,
        config.request(),
        config.schedule.clone(),
        shutdown_signal(),
    )
    .await
}

/// Builds the transport with the configured per-attempt timeout.
fn build_client(config: &ValidatedConfig) -> Result<ReqwestClient, RunError> {
    ReqwestClient::with_timeout(config.timeout).map_err(RunError::ClientBuild)
}

/// Sends `request` as one retriable call and waits for it to settle.
///
/// If `shutdown` completes first, the call is cancelled and the cancellation
/// is reported as its result.
async fn deliver<H, S>(
    dispatcher: &CallDispatcher<H>,
    request: HttpRequest,
    schedule: RetrySchedule,
    shutdown: S,
) -> Result<HttpResponse, RunError>
where
    H: HttpClient + 'static,
    S: Future<Output = ()>,
{
    let (tx, mut rx) = oneshot::channel();
    let call = RetriableCall::new(request, schedule, move |result| {
        let _ = tx.send(result);
    });

    dispatcher.send(&call)?;

    tokio::pin!(shutdown);
    let settled = tokio::select! {
        result = &mut rx => Some(result),
        () = &mut shutdown => None,
    };

    let result = match settled {
        Some(result) => result,
        None => {
            tracing::info!("Shutdown signal received, cancelling call {}", call.id());
            dispatcher.cancel(call.id());
            rx.await
        }
    };

    match result {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => Err(RunError::Call(e)),
        Err(_) => Err(RunError::CompletionLost),
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM on Unix).
///
/// A signal that cannot be listened for never fires.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
