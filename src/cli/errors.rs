//! CLI-specific error types
//!
//! All CLI errors are fatal: the process prints the error and exits 1.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::connection::LifecycleError;
use crate::driver::DriverError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// Memory backend seed error
    SeedError,
    /// I/O error (stdout, runtime)
    IoError,
    /// Connecting or authenticating a location failed
    BootFailed,
    /// HTTP server failed while serving
    ServeFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "DOCREST_CLI_CONFIG_ERROR",
            Self::SeedError => "DOCREST_CLI_SEED_ERROR",
            Self::IoError => "DOCREST_CLI_IO_ERROR",
            Self::BootFailed => "DOCREST_CLI_BOOT_FAILED",
            Self::ServeFailed => "DOCREST_CLI_SERVE_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// Seed error
    pub fn seed_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::SeedError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Boot failed
    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    /// Serve failed
    pub fn serve_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ServeFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<DriverError> for CliError {
    fn from(e: DriverError) -> Self {
        Self::seed_error(e.to_string())
    }
}

impl From<LifecycleError> for CliError {
    fn from(e: LifecycleError) -> Self {
        match e {
            LifecycleError::Config(e) => e.into(),
            other => Self::boot_failed(other.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionError;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::config_error("no locations configured");
        assert_eq!(
            err.to_string(),
            "DOCREST_CLI_CONFIG_ERROR: no locations configured"
        );
    }

    #[test]
    fn test_lifecycle_error_codes() {
        let err = CliError::from(LifecycleError::Connection(ConnectionError::NotFound(
            "main".to_string(),
        )));
        assert_eq!(err.code(), &CliErrorCode::BootFailed);

        let err = CliError::from(LifecycleError::Config(ConfigError::NoLocations));
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }
}
