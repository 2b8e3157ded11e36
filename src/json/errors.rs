//! # Codec Errors

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// JSON codec errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The document holds a value the codec does not render
    #[error("field \"{field}\" has unsupported type {type_name}")]
    UnsupportedType {
        field: String,
        type_name: &'static str,
    },

    /// The write pass ran past the end of the output buffer
    #[error("output buffer overflow: capacity {capacity}, needed at least {needed}")]
    BufferOverflow { capacity: usize, needed: usize },

    /// Measure and write passes disagree
    #[error("measured {measured} bytes but wrote {written} (+1 terminator)")]
    LengthMismatch { measured: usize, written: usize },
}
