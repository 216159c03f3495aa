//! Configuration management for Turnstile.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{Result, TurnstileError};

/// Prefix for environment variable overrides, e.g.
/// `TURNSTILE_RATE_LIMITING__REQUESTS_PER_SECOND=50`.
pub const ENV_PREFIX: &str = "TURNSTILE";

/// Main configuration for the Turnstile service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnstileConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// Self-test traffic configuration
    #[serde(default)]
    pub load_test: LoadTestConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server address
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
        }
    }
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Maximum admitted requests in any trailing second
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: usize,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
        }
    }
}

fn default_requests_per_second() -> usize {
    100
}

/// Self-test traffic configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadTestConfig {
    /// Send traffic at the server once it is listening
    #[serde(default)]
    pub enabled: bool,

    /// Total number of requests to send
    #[serde(default = "default_load_requests")]
    pub requests: usize,

    /// Pause before each request in milliseconds
    #[serde(default = "default_load_interval")]
    pub interval_ms: u64,

    /// Request path on the local server
    #[serde(default = "default_load_path")]
    pub path: String,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests: default_load_requests(),
            interval_ms: default_load_interval(),
            path: default_load_path(),
        }
    }
}

fn default_load_requests() -> usize {
    1000
}

fn default_load_interval() -> u64 {
    10
}

fn default_load_path() -> String {
    "/".to_string()
}

impl LoadTestConfig {
    /// Pause before each request.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl TurnstileConfig {
    /// Load configuration from an optional YAML file overlaid with
    /// `TURNSTILE_*` environment variables.
    ///
    /// Not validated, so callers can apply overrides first.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(
                config::File::from(path).format(config::FileFormat::Yaml),
            );
        }

        let config: TurnstileConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate configuration from a YAML file path, with the
    /// same environment overlay as [`load`](Self::load).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::load(Some(path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.rate_limiting.requests_per_second == 0 {
            return Err(TurnstileError::Config(
                "rate_limiting.requests_per_second must be greater than zero".to_string(),
            ));
        }

        if self.load_test.enabled && self.load_test.requests == 0 {
            return Err(TurnstileError::Config(
                "load_test.requests must be greater than zero when enabled".to_string(),
            ));
        }

        if !self.load_test.path.starts_with('/') {
            return Err(TurnstileError::Config(format!(
                "load_test.path must start with '/', got {:?}",
                self.load_test.path
            )));
        }

        Ok(())
    }
}
