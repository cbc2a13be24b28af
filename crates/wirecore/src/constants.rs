//! Facade constants
//!
//! Contains constants for container bootstrap and configuration.
//! Proxy-layer constants (reserved namespaces, retry bounds) live in
//! `wirecore_proxy::materialize`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "wirecore.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "wirecore";

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "WIRECORE";

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Environment variable consulted for a log filter override
pub const LOG_FILTER_ENV: &str = "WIRECORE_LOG";

/// Default log level when nothing else is configured
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ============================================================================
// PROXY CONSTANTS
// ============================================================================

/// Allocation strategy name for constructor-bypassing allocation
pub const ALLOCATION_BYPASS: &str = "bypass";

/// Allocation strategy name for generated-constructor allocation
pub const ALLOCATION_CONSTRUCTOR: &str = "constructor";
