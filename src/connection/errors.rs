//! # Connection Errors
//!
//! Connection and authentication failures are fatal at startup. At request
//! time they surface as 503 after the single reconnect attempt.

use thiserror::Error;

use crate::config::ConfigError;
use crate::driver::{ConnectStatus, DriverError};

/// Result type for connection operations
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Result type for registry initialization and recovery
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Connection errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("connection {name:?}: {status}")]
    Connect { name: String, status: ConnectStatus },

    #[error("connection {name:?}: {source}")]
    Driver { name: String, source: DriverError },

    #[error("connection {0:?} not found")]
    NotFound(String),

    #[error("connection {name:?}: {count} server addresses cannot form a connection")]
    Topology { name: String, count: usize },

    #[error("connection {0:?}: lock poisoned")]
    Poisoned(String),
}

impl ConnectionError {
    /// Classify a driver failure on connection `name`
    pub fn from_driver(name: &str, err: DriverError) -> Self {
        match err {
            DriverError::Connect(status) => ConnectionError::Connect {
                name: name.to_string(),
                status,
            },
            source => ConnectionError::Driver {
                name: name.to_string(),
                source,
            },
        }
    }
}

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid user/pass for user {user:?} on database {db:?}")]
    InvalidCredentials { db: String, user: String },

    #[error("authentication required for database {db:?}: {message}")]
    AuthenticationRequired { db: String, message: String },

    #[error("probe of database {db:?} failed: {source}")]
    Probe { db: String, source: DriverError },
}

/// Connection or authentication failure during startup or recovery
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}
