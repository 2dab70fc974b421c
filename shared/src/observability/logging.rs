//! Structured logging setup for all services

use serde::Deserialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use super::{ObservabilityError, ObservabilityResult};

/// Log format configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format
    Pretty,
    /// JSON format for log aggregation
    Json,
    /// Compact format
    #[default]
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set, e.g. `info` or
    /// `info,upload_service=debug`
    pub filter: String,
    pub format: LogFormat,
    pub service_name: String,
    pub include_line_numbers: bool,
    pub include_thread_ids: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Compact,
            service_name: "upload-service".to_string(),
            include_line_numbers: false,
            include_thread_ids: false,
        }
    }
}

/// Build the level filter. A `RUST_LOG` value takes precedence over the
/// configured directive.
pub fn build_filter(configured: &str, from_env: Option<String>) -> ObservabilityResult<EnvFilter> {
    let directive = from_env
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| configured.to_string());

    EnvFilter::try_new(&directive)
        .map_err(|e| ObservabilityError::Logging(format!("invalid log filter {directive:?}: {e}")))
}

/// Initialize logging for the service
pub fn init_logging(config: LogConfig) -> ObservabilityResult<()> {
    let env_filter = build_filter(&config.filter, std::env::var(EnvFilter::DEFAULT_ENV).ok())?;

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(config.include_thread_ids)
                        .with_line_number(config.include_line_numbers)
                        .pretty()
                )
                .try_init()
                .map_err(|e| ObservabilityError::Logging(e.to_string()))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_current_span(true)
                        .with_thread_ids(config.include_thread_ids)
                        .with_line_number(config.include_line_numbers)
                )
                .try_init()
                .map_err(|e| ObservabilityError::Logging(e.to_string()))?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(true)
                        .with_thread_ids(config.include_thread_ids)
                )
                .try_init()
                .map_err(|e| ObservabilityError::Logging(e.to_string()))?;
        }
    }

    tracing::info!(
        service = %config.service_name,
        filter = %config.filter,
        format = ?config.format,
        "Logging initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_configured_filter() {
        let filter = build_filter("info", Some("warn".to_string())).unwrap();
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn test_blank_env_falls_back_to_configured_filter() {
        let filter = build_filter("debug", Some("  ".to_string())).unwrap();
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let err = build_filter("upload_service=loud", None).unwrap_err();
        assert!(matches!(err, ObservabilityError::Logging(_)));
    }

    #[test]
    fn test_log_format_default_is_compact() {
        assert_eq!(LogFormat::default(), LogFormat::Compact);
    }
}
