//! # Configuration Errors
//!
//! Every configuration error is fatal: the gateway refuses to start with a
//! partially valid configuration.

use thiserror::Error;

use crate::driver::AddressParseError;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(String),

    #[error("invalid config JSON: {0}")]
    Parse(String),

    #[error("no locations configured")]
    NoLocations,

    #[error("location {0:?} must start with '/'")]
    InvalidLocation(String),

    #[error("location {0:?} is configured more than once")]
    DuplicateLocation(String),

    #[error("location {location:?}: database name is required")]
    MissingDatabase { location: String },

    #[error("location {location:?}: unsupported key type {value:?}")]
    UnsupportedKeyType { location: String, value: String },

    #[error("location {location:?}: field \"filename\" must be of type string")]
    FilenameRequiresString { location: String },

    #[error("location {location:?}: password without username")]
    PasswordWithoutUser { location: String },

    #[error("location {location:?}: username without password")]
    UserWithoutPassword { location: String },

    #[error("location {location:?}: expected 1 to 8 server addresses, got {count}")]
    ServerCount { location: String, count: usize },

    #[error("location {location:?}: replica set name required for {count} servers")]
    MissingReplicaSet { location: String, count: usize },

    #[error("location {location:?}: replica set name given for a single server")]
    UnexpectedReplicaSet { location: String },

    #[error("location {location:?}: {source}")]
    InvalidServer {
        location: String,
        source: AddressParseError,
    },

    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}
