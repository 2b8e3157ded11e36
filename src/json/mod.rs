//! # JSON Codec
//!
//! Two-pass, allocation-exact JSON rendering of fetched documents.
//!
//! `measure` computes the exact buffer size, `encode_into` fills a buffer of
//! that size. Both passes walk the document in the same field order, and the
//! bytes written by the second pass (excluding the terminator) always equal
//! the measured size minus one.
//!
//! Supported value types are object ids, booleans, 32-bit integers and
//! strings. Anything else is rejected with [`CodecError::UnsupportedType`]
//! rather than silently dropped.

pub mod errors;
pub mod measure;
pub mod writer;

pub use errors::{CodecError, CodecResult};
pub use measure::{int_width, measure, quoted_len};
pub use writer::{encode_into, TERMINATOR};

use crate::bson::Document;

/// Render `doc` into a freshly allocated buffer of exactly the measured size.
///
/// The returned bytes exclude the terminator, so their length is
/// `measure(doc) - 1`.
pub fn to_json(doc: &Document) -> CodecResult<Vec<u8>> {
    let measured = measure(doc)?;
    let mut buf = vec![0u8; measured];

    let written = encode_into(doc, &mut buf)?;
    if written + 1 != measured {
        return Err(CodecError::LengthMismatch { measured, written });
    }

    buf.truncate(written);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bson::{ObjectId, Value};

    #[test]
    fn test_to_json_matches_measure() {
        let doc = Document::new()
            .with("_id", ObjectId::from_bytes([7; 12]))
            .with("count", 1000)
            .with("flag", false);

        let body = to_json(&doc).unwrap();
        assert_eq!(body.len(), measure(&doc).unwrap() - 1);
        assert_eq!(
            body,
            br#"{"_id":"070707070707070707070707","count":1000,"flag":false}"#.to_vec()
        );
    }

    #[test]
    fn test_to_json_rejects_unsupported() {
        let doc = Document::new().with("bin", Value::Binary(vec![1, 2]));
        assert!(matches!(
            to_json(&doc),
            Err(CodecError::UnsupportedType { type_name: "binary", .. })
        ));
    }
}
