//! Configuration layer for the `retriable-call` binary.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! The only required field is `url`.
//!
//! Headers are merged: TOML headers are applied first and CLI headers with
//! the same name replace them. A bearer token always sets `Authorization`.
//!
//! The body is taken whole from one source. `--body`/`--body-file` replace
//! `request.body`/`request.body_file` entirely; giving both forms in the same
//! source is an error.
//!
//! # Retry Schedule
//!
//! `--retry-intervals 10,300,1200` (or `retry.intervals`) lists the delay in
//! seconds before each retry, so a call makes at most one attempt more than
//! the list is long. `--no-retry` or an empty list sends exactly once.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command};
pub use error::{ConfigError, field};
pub use toml::{TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
