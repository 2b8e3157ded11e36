//! # Gateway Errors
//!
//! Per-request failures and their HTTP status. Error responses carry no
//! body; the message goes to the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::connection::{AuthError, ConnectionError, LifecycleError};
use crate::driver::DriverError;
use crate::json::CodecError;
use crate::query::BuildError;

/// Result type for request handling
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Request handling errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Malformed percent-encoding in the key
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Key does not parse as the location's key type
    #[error("invalid key: {0}")]
    Build(#[from] BuildError),

    /// No document matches the key
    #[error("document not found")]
    NotFound,

    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Request URI is shorter than its location prefix
    #[error("uri {uri:?} does not extend location {location:?}")]
    InvalidLocation { location: String, uri: String },

    #[error("remove failed: {0}")]
    RemoveFailed(DriverError),

    /// Body larger than two buffers, or spooled to disk
    #[error("unsupported request body: {0}")]
    UnsupportedBody(String),

    #[error("encoding failed: {0}")]
    Codec(#[from] CodecError),

    #[error("database error: {0}")]
    Driver(DriverError),

    #[error("internal error: {0}")]
    Internal(String),

    // ==================
    // Unavailable (503)
    // ==================
    #[error("{0}")]
    Connection(ConnectionError),

    #[error("{0}")]
    Auth(#[from] AuthError),
}

impl GatewayError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Build(_) => StatusCode::BAD_REQUEST,

            // 404 / 405
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,

            // 500 Internal Server Error
            GatewayError::InvalidLocation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::RemoveFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::UnsupportedBody(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Codec(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // Session dropped mid-request
            GatewayError::Driver(DriverError::NotConnected | DriverError::Connect(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::Driver(_) => StatusCode::INTERNAL_SERVER_ERROR,

            GatewayError::Connection(
                ConnectionError::NotFound(_) | ConnectionError::Poisoned(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,

            // 503 Service Unavailable
            GatewayError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Auth(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<ConnectionError> for GatewayError {
    fn from(err: ConnectionError) -> Self {
        GatewayError::Connection(err)
    }
}

impl From<LifecycleError> for GatewayError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Connection(e) => GatewayError::Connection(e),
            LifecycleError::Auth(e) => GatewayError::Auth(e),
            LifecycleError::Config(e) => GatewayError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        self.status_code().into_response()
    }
}
