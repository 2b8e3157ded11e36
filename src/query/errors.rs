//! # Query Build Errors

use thiserror::Error;

use crate::bson::OidParseError;

/// Result type for query building
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors turning a decoded key into a query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("invalid object id key: {0}")]
    InvalidObjectId(#[from] OidParseError),

    #[error("invalid integer key: {0:?}")]
    InvalidInteger(String),

    #[error("key is not valid UTF-8")]
    InvalidUtf8,

    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),
}
