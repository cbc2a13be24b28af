//! Container configuration
//!
//! Handles loading configuration from default values, a TOML file and
//! environment variables, merged in that order with later sources winning.
//! Uses Figment for source merging.

use std::env;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tracing::debug;
use wirecore_domain::{Error, Result};
use wirecore_proxy::AllocationStrategy;

use crate::constants::{
    ALLOCATION_BYPASS, ALLOCATION_CONSTRUCTOR, CONFIG_ENV_PREFIX, DEFAULT_CONFIG_DIR,
    DEFAULT_CONFIG_FILENAME, DEFAULT_LOG_LEVEL,
};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Emit JSON-formatted log lines instead of human-readable ones
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json_format: false,
        }
    }
}

/// Proxy layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Allocation strategy name (`bypass` or `constructor`)
    pub allocation: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            allocation: ALLOCATION_BYPASS.to_string(),
        }
    }
}

impl ProxyConfig {
    /// The parsed allocation strategy
    pub fn allocation_strategy(&self) -> Result<AllocationStrategy> {
        match self.allocation.as_str() {
            ALLOCATION_BYPASS => Ok(AllocationStrategy::Bypass),
            ALLOCATION_CONSTRUCTOR => Ok(AllocationStrategy::Constructor),
            other => Err(Error::configuration(format!(
                "unknown allocation strategy '{other}' (expected '{ALLOCATION_BYPASS}' or \
                 '{ALLOCATION_CONSTRUCTOR}')"
            ))),
        }
    }
}

/// Resolution configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Activate alternative candidates for every request submitted through
    /// the container facade
    pub activate_alternatives: bool,
}

/// Top-level container configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Proxy layer configuration
    pub proxy: ProxyConfig,
    /// Resolution configuration
    pub resolution: ResolutionConfig,
}

/// Configuration loader service
#[derive(Clone, Debug)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,

    /// Environment prefix
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources.
    ///
    /// Sources are merged in this order (later sources override earlier):
    /// 1. Default values from `ContainerConfig::default()`
    /// 2. TOML configuration file (if it exists)
    /// 3. Environment variables with prefix (e.g. `WIRECORE_LOGGING_LEVEL`)
    pub fn load(&self) -> Result<ContainerConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(ContainerConfig::default()));

        if let Some(config_path) = &self.config_path {
            if config_path.exists() {
                debug!(path = %config_path.display(), "merging configuration file");
                figment = figment.merge(Toml::file(config_path));
            }
        } else if let Some(default_path) = Self::find_default_config_path() {
            if default_path.exists() {
                debug!(path = %default_path.display(), "merging configuration file");
                figment = figment.merge(Toml::file(&default_path));
            }
        }

        // Underscore separates nested keys (e.g. WIRECORE_LOGGING_LEVEL)
        figment = figment.merge(Env::prefixed(&format!("{}_", self.env_prefix)).split("_"));

        let config: ContainerConfig = figment.extract().map_err(|source| {
            Error::configuration_with_source("failed to extract configuration", source)
        })?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, config: &ContainerConfig, path: P) -> Result<()> {
        let toml_string = toml::to_string_pretty(config).map_err(|source| {
            Error::configuration_with_source("failed to serialize configuration", source)
        })?;
        std::fs::write(path.as_ref(), toml_string).map_err(|source| {
            Error::configuration_with_source("failed to write configuration file", source)
        })?;
        Ok(())
    }

    /// The configured file path, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    fn validate(config: &ContainerConfig) -> Result<()> {
        crate::logging::parse_log_level(&config.logging.level)?;
        config.proxy.allocation_strategy()?;
        Ok(())
    }

    /// Default configuration file locations, tried in order: the current
    /// directory, then the platform configuration directory.
    fn find_default_config_path() -> Option<PathBuf> {
        let current_dir = env::current_dir().ok()?;
        let candidates = [
            current_dir.join(DEFAULT_CONFIG_FILENAME),
            dirs::config_dir()?
                .join(DEFAULT_CONFIG_DIR)
                .join(DEFAULT_CONFIG_FILENAME),
        ];
        candidates.into_iter().find(|path| path.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ContainerConfig::default();
        assert!(ConfigLoader::validate(&config).is_ok());
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config.proxy.allocation_strategy().unwrap(),
            AllocationStrategy::Bypass
        );
        assert!(!config.resolution.activate_alternatives);
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wirecore.toml");
        std::fs::write(
            &path,
            "[logging]\nlevel = \"debug\"\n\n[proxy]\nallocation = \"constructor\"\n",
        )
        .unwrap();

        let config = ConfigLoader::new().with_config_path(&path).load().unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.proxy.allocation_strategy().unwrap(),
            AllocationStrategy::Constructor
        );
    }

    #[test]
    fn test_unknown_allocation_strategy_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wirecore.toml");
        std::fs::write(&path, "[proxy]\nallocation = \"reflection\"\n").unwrap();

        let err = ConfigLoader::new()
            .with_config_path(&path)
            .load()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_save_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = ContainerConfig::default();
        config.logging.level = "warn".to_string();

        let loader = ConfigLoader::new().with_config_path(&path);
        loader.save_to_file(&config, &path).unwrap();
        let loaded = loader.load().unwrap();
        assert_eq!(loaded.logging.level, "warn");
    }
}
