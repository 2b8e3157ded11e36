//! # Driver Errors

use std::fmt;

use thiserror::Error;

/// Result type for driver calls
pub type DriverResult<T> = Result<T, DriverError>;

/// Outcome of a failed connect or reconnect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStatus {
    /// Could not create a socket
    NoSocket,
    /// TCP connect failed
    ConnectionFailure,
    /// Host name did not resolve
    AddressResolution,
    /// Reached a node that is not the primary
    NotPrimary,
    /// Replica set reported a different name than configured
    BadSetName,
    /// No seed led to a primary
    NoPrimary,
    Unknown,
}

impl fmt::Display for ConnectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConnectStatus::NoSocket => "no socket",
            ConnectStatus::ConnectionFailure => "connection failure",
            ConnectStatus::AddressResolution => "address resolution failure",
            ConnectStatus::NotPrimary => "not primary",
            ConnectStatus::BadSetName => "replica set name does not match",
            ConnectStatus::NoPrimary => "cannot connect to primary node",
            ConnectStatus::Unknown => "unknown error",
        };
        f.write_str(msg)
    }
}

/// Errors surfaced by a driver session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("connect failed: {0}")]
    Connect(ConnectStatus),

    #[error("session is not connected")]
    NotConnected,

    #[error("operation failed: {0}")]
    Operation(String),

    #[error("invalid seed data: {0}")]
    Seed(String),
}
