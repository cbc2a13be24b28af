//! Structured logging with tracing
//!
//! Configures the tracing subscriber from the container configuration. The
//! `WIRECORE_LOG` environment variable overrides the configured level with a
//! full filter directive string.

use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use wirecore_domain::{Error, Result};

pub use crate::config::LoggingConfig;

use crate::constants::LOG_FILTER_ENV;

/// Initialize logging with the provided configuration.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = parse_log_level(&config.level)?;
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(&config.level));

    // json_format changes layer types, so the branches cannot be merged
    let result = if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init()
    };
    result.map_err(|source| {
        Error::configuration_with_source("logging subscriber already installed", source)
    })?;

    info!("logging initialized with level: {level}");
    Ok(())
}

/// Parse a log level string into a tracing [`Level`]
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(Error::configuration(format!(
            "invalid log level '{other}' (expected trace, debug, info, warn or error)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level_accepts_known_levels() {
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
        assert_eq!(parse_log_level("warning").unwrap(), Level::WARN);
    }

    #[test]
    fn test_parse_log_level_rejects_unknown_levels() {
        assert!(parse_log_level("verbose").is_err());
    }

    #[test]
    fn test_json_subscriber_builds_without_installing() {
        let config = LoggingConfig {
            level: "info".to_string(),
            json_format: true,
        };
        // constructing the layered subscriber must work standalone; global
        // installation is covered by init_logging at runtime
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::new(&config.level))
            .with(fmt::layer().json().with_target(true));
    }
}
