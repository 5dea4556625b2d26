//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use http::header::{AUTHORIZATION, HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use url::Url;

use crate::call::RetrySchedule;
use crate::http::HttpRequest;

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// This struct represents a complete, validated configuration where all
/// required fields are present and all values have been validated.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Target URL (required)
    pub url: Url,

    /// HTTP method
    pub method: Method,

    /// HTTP headers, including `Authorization` when a bearer token is set
    pub headers: HeaderMap,

    /// Request body, if any
    pub body: Option<Vec<u8>>,

    /// Delays before each retry
    pub schedule: RetrySchedule,

    /// Per-attempt timeout
    pub timeout: Duration,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self
            .body
            .as_ref()
            .map_or_else(|| "none".to_string(), |b| format!("{} bytes", b.len()));

        write!(
            f,
            "Config {{ url: {}, method: {}, headers: {}, body: {}, retry: [{}], timeout: {}s }}",
            self.url,
            self.method,
            self.headers.len(),
            body,
            self.schedule,
            self.timeout.as_secs(),
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The URL is missing, malformed, or not http/https
    /// - The method is not a supported verb
    /// - Header format is invalid
    /// - Body sources conflict or the body file cannot be read
    /// - A retry interval or the timeout is out of range
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let url = Self::resolve_url(cli, toml)?;
        let method = Self::resolve_method(cli, toml)?;
        let headers = Self::resolve_headers(cli, toml)?;
        let body = Self::resolve_body(cli, toml)?;
        let schedule = Self::resolve_schedule(cli, toml)?;
        let timeout = Self::resolve_timeout(cli, toml)?;

        Ok(Self {
            url,
            method,
            headers,
            body,
            schedule,
            timeout,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    /// Builds the request sent on every attempt.
    #[must_use]
    pub fn request(&self) -> HttpRequest {
        let mut request =
            HttpRequest::new(self.method.clone(), self.url.clone()).with_headers(self.headers.clone());
        request.body.clone_from(&self.body);
        request
    }

    fn resolve_url(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Url, ConfigError> {
        // CLI takes precedence
        let url_str = cli
            .url
            .as_deref()
            .or_else(|| toml.and_then(|t| t.request.url.as_deref()))
            .ok_or_else(|| {
                ConfigError::missing(field::URL, "Use --url or set request.url in config file")
            })?;

        HttpRequest::parse_url(url_str).map_err(|reason| ConfigError::InvalidUrl {
            url: url_str.to_string(),
            reason,
        })
    }

    fn resolve_method(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Method, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let method_str = cli
            .method
            .as_deref()
            .or_else(|| toml.and_then(|t| t.request.method.as_deref()))
            .unwrap_or(defaults::METHOD);

        HttpRequest::parse_method(method_str)
            .ok_or_else(|| ConfigError::InvalidMethod(method_str.to_string()))
    }

    fn resolve_headers(cli: &Cli, toml: Option<&TomlConfig>) -> Result<HeaderMap, ConfigError> {
        let mut headers = HeaderMap::new();

        // Add TOML headers first (CLI can override)
        if let Some(toml) = toml {
            for (name, value) in &toml.request.headers {
                let header_name = parse_header_name(name)?;
                let header_value = parse_header_value(name, value)?;
                headers.insert(header_name, header_value);
            }
        }

        // Add CLI headers (override TOML)
        for header_str in &cli.headers {
            let (name, value) = parse_header_string(header_str)?;
            let header_name = parse_header_name(&name)?;
            let header_value = parse_header_value(&name, &value)?;
            headers.insert(header_name, header_value);
        }

        // Handle bearer token (CLI wins, then TOML)
        let bearer = cli
            .bearer
            .as_deref()
            .or_else(|| toml.and_then(|t| t.request.bearer.as_deref()));

        if let Some(token) = bearer {
            let auth_value = format!("Bearer {token}");
            let mut header_value = parse_header_value("Authorization", &auth_value)?;
            header_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, header_value);
        }

        Ok(headers)
    }

    fn resolve_body(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Option<Vec<u8>>, ConfigError> {
        // A body given on the command line replaces the config file's body
        // entirely, whichever form either of them uses.
        let cli_source = body_source(
            cli.body.as_deref(),
            cli.body_file.as_deref(),
            "command line",
        )?;
        let source = match cli_source {
            Some(source) => Some(source),
            None => match toml {
                Some(t) => body_source(
                    t.request.body.as_deref(),
                    t.request.body_file.as_deref(),
                    "config file",
                )?,
                None => None,
            },
        };

        match source {
            None => Ok(None),
            Some(BodySource::Inline(text)) => Ok(Some(text.as_bytes().to_vec())),
            Some(BodySource::File(path)) => std::fs::read(path)
                .map(Some)
                .map_err(|e| ConfigError::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                }),
        }
    }

    fn resolve_schedule(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<RetrySchedule, ConfigError> {
        if cli.no_retry {
            return Ok(RetrySchedule::none());
        }

        // Priority: CLI explicit > TOML > default
        let intervals = cli
            .retry_intervals
            .as_deref()
            .or_else(|| toml.and_then(|t| t.retry.intervals.as_deref()))
            .unwrap_or(&defaults::RETRY_INTERVALS_SECS[..]);

        if let Some(too_long) = intervals
            .iter()
            .find(|&&secs| secs > defaults::RETRY_INTERVAL_MAX_SECS)
        {
            return Err(ConfigError::InvalidRetry(format!(
                "interval {too_long}s exceeds the maximum of {}s",
                defaults::RETRY_INTERVAL_MAX_SECS
            )));
        }

        Ok(RetrySchedule::from_secs(intervals))
    }

    fn resolve_timeout(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Duration, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let seconds = cli
            .timeout
            .or_else(|| toml.and_then(|t| t.transport.timeout))
            .unwrap_or(defaults::TIMEOUT_SECS);

        if seconds == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "timeout",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Duration::from_secs(seconds))
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

enum BodySource<'a> {
    Inline(&'a str),
    File(&'a Path),
}

fn body_source<'a>(
    inline: Option<&'a str>,
    file: Option<&'a Path>,
    origin: &'static str,
) -> Result<Option<BodySource<'a>>, ConfigError> {
    match (inline, file) {
        (Some(_), Some(_)) => Err(ConfigError::ConflictingBody { origin }),
        (Some(text), None) => Ok(Some(BodySource::Inline(text))),
        (None, Some(path)) => Ok(Some(BodySource::File(path))),
        (None, None) => Ok(None),
    }
}

fn parse_header_string(s: &str) -> Result<(String, String), ConfigError> {
    // Try "Key=Value" format first
    if let Some((name, value)) = s.split_once('=') {
        return Ok((name.trim().to_string(), value.trim().to_string()));
    }

    // Try "Key: Value" format
    if let Some((name, value)) = s.split_once(':') {
        return Ok((name.trim().to_string(), value.trim().to_string()));
    }

    Err(ConfigError::InvalidHeader {
        value: s.to_string(),
    })
}

fn parse_header_name(name: &str) -> Result<HeaderName, ConfigError> {
    name.parse::<HeaderName>()
        .map_err(|e| ConfigError::InvalidHeaderName {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

fn parse_header_value(name: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeaderValue {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
