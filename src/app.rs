//! Process plumbing for the binary: exit statuses, logging and config hints.

use retriable_call::config::{ConfigError, field};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Exit statuses of `retriable-call`.
pub mod exit_code {
    use std::process::ExitCode;

    const DELIVERY_FAILED: u8 = 2;
    /// 128 + SIGINT, the status shells report for an interrupted command.
    const INTERRUPTED: u8 = 130;

    /// The response was delivered, or `init` wrote its template.
    pub const SUCCESS: ExitCode = ExitCode::SUCCESS;

    /// Arguments or config file were rejected; nothing was sent.
    pub const CONFIG_ERROR: ExitCode = ExitCode::FAILURE;

    /// The call settled with a fatal error or ran out of retries.
    pub fn runtime_error() -> ExitCode {
        ExitCode::from(DELIVERY_FAILED)
    }

    /// The call was cancelled by Ctrl+C or SIGTERM.
    pub fn cancelled() -> ExitCode {
        ExitCode::from(INTERRUPTED)
    }
}

/// Returns a follow-up hint for errors the user can fix in an obvious way.
fn config_hint(error: &ConfigError) -> Option<&'static str> {
    match error {
        ConfigError::MissingRequired { field: f, .. } if *f == field::URL => {
            Some("Run 'retriable-call init' to generate a configuration template.")
        }
        ConfigError::ConflictingBody { .. } => {
            Some("Give the body inline or as a file, not both.")
        }
        ConfigError::InvalidHeader { .. } => {
            Some("Example: --header Content-Type=application/json")
        }
        ConfigError::InvalidRetry(_) => {
            Some("Example: --retry-intervals 10,300,1200 (seconds), or --no-retry.")
        }
        _ => None,
    }
}

/// Prints the hint for `error` to stderr, if it has one.
pub fn print_config_hint(error: &ConfigError) {
    if let Some(hint) = config_hint(error) {
        eprintln!("\n{hint}");
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides `--verbose`.
pub fn setup_tracing(verbose: bool) {
    let default_level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    // Stdout carries the response body.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
