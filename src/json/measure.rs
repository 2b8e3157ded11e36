//! # Measure Pass
//!
//! Computes the exact buffer size the write pass needs for a document,
//! including one byte for the trailing terminator.
//!
//! Per field the size grows by the quoted key, one colon, the value width and
//! one slot for the separator. The separator slot of the last field is where
//! the closing brace lands, which leaves the slot reserved for the opening
//! brace pair free for the terminator.

use crate::bson::{Document, Value, OID_HEX_LEN};

use super::errors::{CodecError, CodecResult};

/// Width of `true`
const TRUE_WIDTH: usize = 4;

/// Width of `false`
const FALSE_WIDTH: usize = 5;

/// Exact size of the buffer `encode_into` will fill for `doc`.
///
/// The rendered body is always one byte shorter than this.
pub fn measure(doc: &Document) -> CodecResult<usize> {
    let mut len = 2; // {}

    for (key, value) in doc.iter() {
        len += quoted_len(key) + 1;
        len += value_width(key, value)?;
        len += 1;
    }

    if doc.is_empty() {
        // No field slot to borrow the terminator from
        len += 1;
    }

    Ok(len)
}

/// Width of a single rendered value.
pub fn value_width(field: &str, value: &Value) -> CodecResult<usize> {
    match value {
        Value::ObjectId(_) => Ok(OID_HEX_LEN + 2),
        Value::Boolean(true) => Ok(TRUE_WIDTH),
        Value::Boolean(false) => Ok(FALSE_WIDTH),
        Value::Int32(v) => Ok(int_width(*v)),
        Value::String(s) => Ok(quoted_len(s)),
        other => {
            tracing::warn!(
                field = field,
                type_name = other.type_name(),
                "unsupported field type in document"
            );
            Err(CodecError::UnsupportedType {
                field: field.to_string(),
                type_name: other.type_name(),
            })
        }
    }
}

/// Number of characters in the decimal form of `v`, including a leading `-`.
pub fn int_width(v: i32) -> usize {
    let mut n = v.unsigned_abs();
    let mut width = usize::from(v < 0);

    loop {
        width += 1;
        n /= 10;
        if n == 0 {
            break;
        }
    }

    width
}

/// Length of `s` once escaped and wrapped in quotes.
pub fn quoted_len(s: &str) -> usize {
    2 + s.bytes().map(escaped_width).sum::<usize>()
}

/// Output width of one source byte inside a JSON string.
pub(crate) fn escaped_width(b: u8) -> usize {
    match b {
        b'"' | b'\\' | b'\n' | b'\r' | b'\t' | 0x08 | 0x0c => 2,
        0x00..=0x1f => 6,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bson::ObjectId;

    #[test]
    fn test_int_width() {
        assert_eq!(int_width(0), 1);
        assert_eq!(int_width(9), 1);
        assert_eq!(int_width(10), 2);
        assert_eq!(int_width(-1), 2);
        assert_eq!(int_width(i32::MAX), 10);
        assert_eq!(int_width(i32::MIN), 11);
    }

    #[test]
    fn test_empty_document() {
        // "{}" plus terminator
        assert_eq!(measure(&Document::new()).unwrap(), 3);
    }

    #[test]
    fn test_field_widths() {
        let oid = ObjectId::parse_hex("507f1f77bcf86cd799439011").unwrap();
        // {"_id":"507f1f77bcf86cd799439011"} is 34 bytes, +1 terminator
        let doc = Document::new().with("_id", oid);
        assert_eq!(measure(&doc).unwrap(), 35);

        // {"a":true,"b":false} is 20 bytes
        let doc = Document::new().with("a", true).with("b", false);
        assert_eq!(measure(&doc).unwrap(), 21);

        // {"n":"hi"} is 10 bytes
        let doc = Document::new().with("n", "hi");
        assert_eq!(measure(&doc).unwrap(), 11);
    }

    #[test]
    fn test_escaped_string_width() {
        assert_eq!(quoted_len("plain"), 7);
        assert_eq!(quoted_len("a\"b"), 6);
        assert_eq!(quoted_len("\u{1}"), 8);
    }

    #[test]
    fn test_unsupported_type_is_an_error() {
        let doc = Document::new().with("ok", 1).with("score", Value::Double(1.5));
        assert_eq!(
            measure(&doc),
            Err(CodecError::UnsupportedType {
                field: "score".to_string(),
                type_name: "double",
            })
        );
    }
}
