//! Configuration structures.
//!
//! Configuration is loaded from a JSON file; every section falls back to its
//! defaults when absent.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::{Error, Result};

/// Global gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiter configuration.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Capability loader configuration.
    #[serde(default)]
    pub loader: LoaderConfig,
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the gateway unusable.
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.max_requests == 0 {
            return Err(Error::validation("rate_limit.max_requests must be positive"));
        }
        if self.rate_limit.window.is_zero() {
            return Err(Error::validation("rate_limit.window must be positive"));
        }
        if self.server.max_message_bytes == 0 {
            return Err(Error::validation("server.max_message_bytes must be positive"));
        }
        Ok(())
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Name reported in `initialize` and the info manifest.
    pub name: String,

    /// Version reported in `initialize` and the info manifest.
    pub version: String,

    /// Maximum accepted size of one protocol message in bytes.
    pub max_message_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "toolgate".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            max_message_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Sliding-window rate limit settings. Fixed at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Length of the trailing window.
    #[serde(with = "humantime_serde")]
    pub window: Duration,

    /// Maximum admitted requests per identifier within the window.
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(60_000),
            max_requests: 100,
        }
    }
}

/// What to do when a tool id is registered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Later registration replaces the earlier one (logged as a warning).
    #[default]
    Replace,
    /// Later registration is refused and reported as a load error.
    Reject,
}

/// Capability loader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Upper bound on a single module's registration.
    #[serde(with = "humantime_serde")]
    pub module_timeout: Duration,

    /// Duplicate tool id handling.
    pub duplicate_policy: DuplicatePolicy,

    /// Tools sampled per category when synthesizing descriptions.
    pub sample_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            module_timeout: Duration::from_secs(5),
            duplicate_policy: DuplicatePolicy::Replace,
            sample_size: 3,
        }
    }
}
