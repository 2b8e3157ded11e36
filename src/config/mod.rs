//! # Gateway Configuration
//!
//! Loads the gateway's JSON configuration file, applies defaults and
//! validates every location before anything connects.
//!
//! ```json
//! {
//!   "http": { "host": "0.0.0.0", "port": 8080 },
//!   "reconnect_backoff_ms": 500,
//!   "client_body_buffer_size": 8192,
//!   "memory_seed": "./seed.json",
//!   "locations": [
//!     { "location": "/docs/", "database": "app" },
//!     { "location": "/files/", "database": "app", "field": "filename",
//!       "user": "svc", "pass": "s3cret",
//!       "connection": "rs0", "servers": ["db1:27017", "db2:27017"], "replica_set": "rs0" }
//!   ]
//! }
//! ```

pub mod errors;
pub mod location;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::gateway::HttpServerConfig;

pub use errors::{ConfigError, ConfigResult};
pub use location::{Credentials, LocationConfig, RawLocation};

/// Default pause between disconnect and reconnect (milliseconds)
pub const DEFAULT_RECONNECT_BACKOFF_MS: u64 = 500;

/// Default size of one request body buffer (bytes)
pub const DEFAULT_BODY_BUFFER_SIZE: usize = 8192;

fn default_backoff_ms() -> u64 {
    DEFAULT_RECONNECT_BACKOFF_MS
}

fn default_body_buffer_size() -> usize {
    DEFAULT_BODY_BUFFER_SIZE
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGatewayConfig {
    #[serde(default)]
    http: HttpServerConfig,

    #[serde(default = "default_backoff_ms")]
    reconnect_backoff_ms: u64,

    #[serde(default = "default_body_buffer_size")]
    client_body_buffer_size: usize,

    #[serde(default)]
    memory_seed: Option<PathBuf>,

    #[serde(default)]
    locations: Vec<RawLocation>,
}

/// Fully resolved gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub http: HttpServerConfig,
    pub reconnect_backoff: Duration,
    pub client_body_buffer_size: usize,
    pub memory_seed: Option<PathBuf>,
    pub locations: Vec<LocationConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            http: HttpServerConfig::default(),
            reconnect_backoff: Duration::from_millis(DEFAULT_RECONNECT_BACKOFF_MS),
            client_body_buffer_size: DEFAULT_BODY_BUFFER_SIZE,
            memory_seed: None,
            locations: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;

        let mut config = Self::parse(&content)?;

        // A relative seed path is relative to the config file
        if let (Some(seed), Some(dir)) = (&config.memory_seed, path.parent()) {
            if seed.is_relative() {
                config.memory_seed = Some(dir.join(seed));
            }
        }

        Ok(config)
    }

    /// Parse and validate configuration JSON
    pub fn parse(content: &str) -> ConfigResult<Self> {
        let raw: RawGatewayConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let locations = raw
            .locations
            .iter()
            .map(LocationConfig::resolve)
            .collect::<ConfigResult<Vec<_>>>()?;

        let config = Self {
            http: raw.http,
            reconnect_backoff: Duration::from_millis(raw.reconnect_backoff_ms),
            client_body_buffer_size: raw.client_body_buffer_size,
            memory_seed: raw.memory_seed,
            locations,
        };
        config.validate()?;

        Ok(config)
    }

    /// Validate cross-location rules
    pub fn validate(&self) -> ConfigResult<()> {
        if self.locations.is_empty() {
            return Err(ConfigError::NoLocations);
        }
        self.http.listen_addr()?;
        if self.client_body_buffer_size == 0 {
            return Err(ConfigError::InvalidSetting(
                "client_body_buffer_size must be > 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for loc in &self.locations {
            loc.validate()?;
            if !seen.insert(loc.location.as_str()) {
                return Err(ConfigError::DuplicateLocation(loc.location.clone()));
            }
        }

        Ok(())
    }
}
