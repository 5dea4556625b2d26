//! Tests for validated configuration.

use std::time::Duration;

use http::Method;

use crate::call::RetrySchedule;

use super::ConfigError;
use super::cli::Cli;
use super::toml::TomlConfig;
use super::validated::ValidatedConfig;

/// Helper to create CLI args from a slice
fn cli(args: &[&str]) -> Cli {
    let mut full_args = vec!["retriable-call"];
    full_args.extend(args);
    Cli::parse_from_iter(full_args)
}

/// Helper to parse TOML config
fn toml(content: &str) -> TomlConfig {
    TomlConfig::parse(content).unwrap()
}

mod required_fields {
    use super::*;

    #[test]
    fn missing_url_returns_error() {
        let cli = cli(&[]);
        let result = ValidatedConfig::from_raw(&cli, None);

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequired { field: "url", .. })
        ));
    }

    #[test]
    fn url_from_cli() {
        let cli = cli(&["--url", "https://example.com"]);
        let config = ValidatedConfig::from_raw(&cli, None).unwrap();

        assert_eq!(config.url.as_str(), "https://example.com/");
    }

    #[test]
    fn url_from_toml() {
        let cli = cli(&[]);
        let toml = toml(
            r#"
            [request]
            url = "https://example.com/logs"
        "#,
        );

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();

        assert_eq!(config.url.as_str(), "https://example.com/logs");
    }
}

mod defaults {
    use super::*;

    #[test]
    fn unset_options_take_defaults() {
        let cli = cli(&["--url", "https://example.com"]);
        let config = ValidatedConfig::from_raw(&cli, None).unwrap();

        assert_eq!(config.method, Method::POST);
        assert!(config.headers.is_empty());
        assert!(config.body.is_none());
        assert_eq!(config.schedule, RetrySchedule::default());
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.verbose);
    }
}

mod cli_precedence {
    use super::*;

    #[test]
    fn cli_url_overrides_toml() {
        let cli = cli(&["--url", "https://cli.example.com"]);
        let toml = toml(
            r#"
            [request]
            url = "https://toml.example.com"
        "#,
        );

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();

        assert_eq!(config.url.as_str(), "https://cli.example.com/");
    }

    #[test]
    fn cli_method_overrides_toml() {
        let cli = cli(&["--url", "https://example.com", "--method", "PATCH"]);
        let toml = toml(
            r#"
            [request]
            method = "PUT"
        "#,
        );

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();

        assert_eq!(config.method, Method::PATCH);
    }

    #[test]
    fn toml_method_used_without_cli() {
        let cli = cli(&["--url", "https://example.com"]);
        let toml = toml(
            r#"
            [request]
            method = "put"
        "#,
        );

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();

        assert_eq!(config.method, Method::PUT);
    }

    #[test]
    fn cli_intervals_override_toml() {
        let cli = cli(&["--url", "https://example.com", "--retry-intervals", "2,4"]);
        let toml = toml(
            r"
            [retry]
            intervals = [100, 200, 300]
        ",
        );

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();

        assert_eq!(config.schedule, RetrySchedule::from_secs(&[2, 4]));
    }

    #[test]
    fn no_retry_overrides_toml_intervals() {
        let cli = cli(&["--url", "https://example.com", "--no-retry"]);
        let toml = toml(
            r"
            [retry]
            intervals = [1, 2]
        ",
        );

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();

        assert!(config.schedule.is_empty());
    }

    #[test]
    fn toml_intervals_used_without_cli() {
        let cli = cli(&["--url", "https://example.com"]);
        let toml = toml(
            r"
            [retry]
            intervals = [3]
        ",
        );

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();

        assert_eq!(config.schedule, RetrySchedule::from_secs(&[3]));
    }

    #[test]
    fn empty_toml_intervals_disable_retries() {
        let cli = cli(&["--url", "https://example.com"]);
        let toml = toml("[retry]\nintervals = []");

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();

        assert_eq!(config.schedule.max_attempts(), 1);
    }

    #[test]
    fn cli_timeout_overrides_toml() {
        let cli = cli(&["--url", "https://example.com", "--timeout", "7"]);
        let toml = toml("[transport]\ntimeout = 60");

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();

        assert_eq!(config.timeout, Duration::from_secs(7));
    }
}

mod headers {
    use super::*;

    #[test]
    fn cli_headers_in_both_formats() {
        let cli = cli(&[
            "--url",
            "https://example.com",
            "--header",
            "X-Api-Key=secret",
            "--header",
            "Content-Type: application/json",
        ]);
        let config = ValidatedConfig::from_raw(&cli, None).unwrap();

        assert_eq!(config.headers.get("x-api-key").unwrap(), "secret");
        assert_eq!(
            config.headers.get("content-type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn cli_header_overrides_toml_header() {
        let cli = cli(&["--url", "https://example.com", "--header", "X-Env=cli"]);
        let toml = toml(
            r#"
            [request.headers]
            X-Env = "toml"
            X-Other = "kept"
        "#,
        );

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();

        assert_eq!(config.headers.get("x-env").unwrap(), "cli");
        assert_eq!(config.headers.get("x-other").unwrap(), "kept");
    }

    #[test]
    fn bearer_sets_sensitive_authorization() {
        let cli = cli(&["--url", "https://example.com", "--bearer", "abc123"]);
        let config = ValidatedConfig::from_raw(&cli, None).unwrap();

        let auth = config.headers.get(http::header::AUTHORIZATION).unwrap();
        assert_eq!(auth, "Bearer abc123");
        assert!(auth.is_sensitive());
    }

    #[test]
    fn cli_bearer_overrides_toml_bearer() {
        let cli = cli(&["--url", "https://example.com", "--bearer", "cli-token"]);
        let toml = toml(
            r#"
            [request]
            bearer = "toml-token"
        "#,
        );

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();

        assert_eq!(
            config.headers.get(http::header::AUTHORIZATION).unwrap(),
            "Bearer cli-token"
        );
    }

    #[test]
    fn header_without_separator_is_rejected() {
        let cli = cli(&["--url", "https://example.com", "--header", "NoSeparator"]);
        let result = ValidatedConfig::from_raw(&cli, None);

        assert!(matches!(result, Err(ConfigError::InvalidHeader { .. })));
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let cli = cli(&["--url", "https://example.com", "--header", "Bad Name=value"]);
        let result = ValidatedConfig::from_raw(&cli, None);

        assert!(matches!(result, Err(ConfigError::InvalidHeaderName { .. })));
    }

    #[test]
    fn invalid_header_value_is_rejected() {
        let cli = cli(&["--url", "https://example.com"]);
        let toml = toml("[request.headers]\nX-Bad = \"line\\nbreak\"");

        let result = ValidatedConfig::from_raw(&cli, Some(&toml));

        assert!(matches!(
            result,
            Err(ConfigError::InvalidHeaderValue { .. })
        ));
    }
}

mod body {
    use std::io::Write;
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn inline_body_from_cli() {
        let cli = cli(&["--url", "https://example.com", "--body", "hello"]);
        let config = ValidatedConfig::from_raw(&cli, None).unwrap();

        assert_eq!(config.body.as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn body_file_from_cli_is_read() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"logs":[1,2]}"#).unwrap();

        let cli = cli(&[
            "--url",
            "https://example.com",
            "--body-file",
            file.path().to_str().unwrap(),
        ]);
        let config = ValidatedConfig::from_raw(&cli, None).unwrap();

        assert_eq!(config.body.as_deref(), Some(&br#"{"logs":[1,2]}"#[..]));
    }

    #[test]
    fn missing_body_file_is_reported() {
        let cli = cli(&[
            "--url",
            "https://example.com",
            "--body-file",
            "nonexistent_body_12345.json",
        ]);
        let result = ValidatedConfig::from_raw(&cli, None);

        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }

    #[test]
    fn cli_body_replaces_toml_body_file() {
        let cli = cli(&["--url", "https://example.com", "--body", "from-cli"]);
        let toml = toml(
            r#"
            [request]
            body_file = "nonexistent_body_12345.json"
        "#,
        );

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();

        assert_eq!(config.body.as_deref(), Some(&b"from-cli"[..]));
    }

    #[test]
    fn toml_body_used_without_cli() {
        let cli = cli(&["--url", "https://example.com"]);
        let toml = toml(
            r#"
            [request]
            body = "from-toml"
        "#,
        );

        let config = ValidatedConfig::from_raw(&cli, Some(&toml)).unwrap();

        assert_eq!(config.body.as_deref(), Some(&b"from-toml"[..]));
    }

    #[test]
    fn both_body_forms_in_toml_conflict() {
        let cli = cli(&["--url", "https://example.com"]);
        let toml = toml(
            r#"
            [request]
            body = "inline"
            body_file = "payload.json"
        "#,
        );

        let result = ValidatedConfig::from_raw(&cli, Some(&toml));

        assert!(matches!(
            result,
            Err(ConfigError::ConflictingBody {
                origin: "config file"
            })
        ));
    }
}

mod validation {
    use super::*;

    #[test]
    fn malformed_url_is_rejected() {
        let cli = cli(&["--url", "not a url"]);
        let result = ValidatedConfig::from_raw(&cli, None);

        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let cli = cli(&["--url", "ftp://example.com/file"]);
        let result = ValidatedConfig::from_raw(&cli, None);

        match result {
            Err(ConfigError::InvalidUrl { reason, .. }) => assert!(reason.contains("ftp")),
            other => panic!("expected InvalidUrl, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_method_is_rejected() {
        let cli = cli(&["--url", "https://example.com", "--method", "BREW"]);
        let result = ValidatedConfig::from_raw(&cli, None);

        assert!(matches!(result, Err(ConfigError::InvalidMethod(m)) if m == "BREW"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cli = cli(&["--url", "https://example.com", "--timeout", "0"]);
        let result = ValidatedConfig::from_raw(&cli, None);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidDuration {
                field: "timeout",
                ..
            })
        ));
    }

    #[test]
    fn oversized_interval_is_rejected() {
        let cli = cli(&["--url", "https://example.com", "--retry-intervals", "1,90000"]);
        let result = ValidatedConfig::from_raw(&cli, None);

        match result {
            Err(ConfigError::InvalidRetry(reason)) => assert!(reason.contains("90000")),
            other => panic!("expected InvalidRetry, got {other:?}"),
        }
    }

    #[test]
    fn zero_interval_is_allowed() {
        let cli = cli(&["--url", "https://example.com", "--retry-intervals", "0,0"]);
        let config = ValidatedConfig::from_raw(&cli, None).unwrap();

        assert_eq!(config.schedule.total_delay(), Duration::ZERO);
        assert_eq!(config.schedule.max_attempts(), 3);
    }
}

mod request {
    use super::*;

    #[test]
    fn request_carries_every_part() {
        let cli = cli(&[
            "--url",
            "https://in.example.com/logs",
            "--method",
            "PUT",
            "--header",
            "X-Install-Id=abc",
            "--body",
            "payload",
        ]);
        let config = ValidatedConfig::from_raw(&cli, None).unwrap();

        let request = config.request();

        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.url.as_str(), "https://in.example.com/logs");
        assert_eq!(request.headers.get("x-install-id").unwrap(), "abc");
        assert_eq!(request.body.as_deref(), Some(&b"payload"[..]));
    }

    #[test]
    fn display_hides_header_values() {
        let cli = cli(&[
            "--url",
            "https://example.com",
            "--bearer",
            "top-secret",
            "--body",
            "12345",
        ]);
        let config = ValidatedConfig::from_raw(&cli, None).unwrap();

        let shown = config.to_string();

        assert!(!shown.contains("top-secret"));
        assert!(shown.contains("headers: 1"));
        assert!(shown.contains("body: 5 bytes"));
        assert!(shown.contains("timeout: 30s"));
    }
}

mod config_load {
    use std::io::Write;
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn load_from_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [request]
            url = "https://example.com/logs"

            [retry]
            intervals = [1]
        "#
        )
        .unwrap();

        let cli = cli(&["--config", file.path().to_str().unwrap()]);
        let config = ValidatedConfig::load(&cli).unwrap();

        assert_eq!(config.url.as_str(), "https://example.com/logs");
        assert_eq!(config.schedule, RetrySchedule::from_secs(&[1]));
    }

    #[test]
    fn load_without_config_file() {
        let cli = cli(&["--url", "https://example.com"]);
        let config = ValidatedConfig::load(&cli).unwrap();

        assert_eq!(config.url.as_str(), "https://example.com/");
    }

    #[test]
    fn load_missing_config_file_returns_error() {
        let cli = cli(&["--config", "nonexistent_config_12345.toml"]);
        let result = ValidatedConfig::load(&cli);

        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }
}

mod write_config {
    use std::fs;
    use tempfile::tempdir;

    use super::super::validated::write_default_config;
    use super::*;

    #[test]
    fn write_default_config_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test-config.toml");

        write_default_config(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[request]"));
        assert!(content.contains("[retry]"));
        assert!(content.contains("[transport]"));
    }

    #[test]
    fn write_default_config_to_invalid_path_returns_error() {
        use std::path::Path;
        let path = Path::new("/nonexistent_dir_12345/config.toml");
        let result = write_default_config(path);

        assert!(matches!(result, Err(ConfigError::FileWrite { .. })));
    }
}
