//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Request configuration section
    #[serde(default)]
    pub request: RequestSection,

    /// Retry schedule configuration
    #[serde(default)]
    pub retry: RetrySection,

    /// Transport configuration
    #[serde(default)]
    pub transport: TransportSection,
}

/// Request configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestSection {
    /// Target URL
    pub url: Option<String>,

    /// HTTP method (default: POST)
    pub method: Option<String>,

    /// HTTP headers as key-value pairs
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Bearer token for Authorization header
    pub bearer: Option<String>,

    /// Inline request body
    pub body: Option<String>,

    /// Path to a file holding the request body
    pub body_file: Option<PathBuf>,
}

/// Retry schedule configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Delays before each retry, in seconds. An empty list disables retries.
    pub intervals: Option<Vec<u64>>,
}

/// Transport configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportSection {
    /// Per-attempt timeout in seconds
    pub timeout: Option<u64>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# Retriable Call Configuration File

[request]
# Target URL (required, http or https)
# url = "https://in.example.com/logs?api-version=1.0.0"

# HTTP method (default: POST, can be overridden by --method CLI flag)
# method = "POST"

# Bearer token for Authorization header
# bearer = "your-token-here"

# Request body, inline or read from a file (not both)
# body = '{"logs": []}'
# body_file = "payload.json"

# HTTP headers
# [request.headers]
# Content-Type = "application/json"

[retry]
# Delays in seconds before each retry (default: 10s, 5min, 20min)
# An empty list sends once without retrying
intervals = [10, 300, 1200]

[transport]
# Per-attempt timeout in seconds (default: 30)
timeout = 30
"#
    .to_string()
}
