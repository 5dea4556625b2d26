//! Errors raised while loading the binary's configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Why a configuration could not be turned into a request.
///
/// File errors carry the path involved. Validation errors carry the offending
/// value so the message can be acted on without rerunning with `--verbose`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file or a body file could not be read.
    #[error("Failed to read file '{}': {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// `init` could not write its template.
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value neither the command line nor the config file provided.
    ///
    /// `field` is one of the names in [`field`].
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired {
        field: &'static str,
        hint: &'static str,
    },

    /// The target is not an absolute http/https URL.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid HTTP method '{0}'")]
    InvalidMethod(String),

    /// A `--header`/`request.headers` entry without a `=` or `:` separator.
    #[error("Invalid header format '{value}': expected 'Key=Value' or 'Key: Value'")]
    InvalidHeader { value: String },

    #[error("Invalid header name '{name}': {reason}")]
    InvalidHeaderName { name: String, reason: String },

    #[error("Invalid header value for '{name}': {reason}")]
    InvalidHeaderValue { name: String, reason: String },

    /// Inline body and body file given together by one source.
    ///
    /// `origin` is "command line" or "config file".
    #[error("Conflicting body sources in {origin}: use either body or body_file, not both")]
    ConflictingBody { origin: &'static str },

    /// A retry interval outside the accepted range.
    #[error("Invalid retry configuration: {0}")]
    InvalidRetry(String),

    /// A timeout of zero or one too large to be useful.
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration {
        field: &'static str,
        reason: String,
    },
}

/// Field names reported by [`ConfigError::MissingRequired`].
pub mod field {
    pub const URL: &str = "url";
}

impl ConfigError {
    /// Shorthand for [`ConfigError::MissingRequired`].
    #[must_use]
    pub const fn missing(field: &'static str, hint: &'static str) -> Self {
        Self::MissingRequired { field, hint }
    }
}
