//! # Write Pass
//!
//! Fills a caller-provided buffer with the JSON form of a document. The
//! buffer is expected to be exactly `measure(doc)` bytes; the writer never
//! grows it and reports an overflow instead of writing past the end.

use crate::bson::{Document, Value};

use super::errors::{CodecError, CodecResult};
use super::measure::value_width;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Byte written after the closing brace
pub const TERMINATOR: u8 = 0;

/// Bounded cursor over an output slice
struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn put(&mut self, bytes: &[u8]) -> CodecResult<()> {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            return Err(CodecError::BufferOverflow {
                capacity: self.buf.len(),
                needed: end,
            });
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    fn put_byte(&mut self, b: u8) -> CodecResult<()> {
        self.put(&[b])
    }

    fn put_quoted(&mut self, s: &str) -> CodecResult<()> {
        self.put_byte(b'"')?;
        for b in s.bytes() {
            match b {
                b'"' => self.put(b"\\\"")?,
                b'\\' => self.put(b"\\\\")?,
                b'\n' => self.put(b"\\n")?,
                b'\r' => self.put(b"\\r")?,
                b'\t' => self.put(b"\\t")?,
                0x08 => self.put(b"\\b")?,
                0x0c => self.put(b"\\f")?,
                0x00..=0x1f => self.put(&[
                    b'\\',
                    b'u',
                    b'0',
                    b'0',
                    HEX_DIGITS[(b >> 4) as usize],
                    HEX_DIGITS[(b & 0x0f) as usize],
                ])?,
                _ => self.put_byte(b)?,
            }
        }
        self.put_byte(b'"')
    }

    fn put_int(&mut self, v: i32) -> CodecResult<()> {
        // i32::MIN is 11 characters
        let mut digits = [0u8; 11];
        let mut i = digits.len();
        let mut n = v.unsigned_abs();

        loop {
            i -= 1;
            digits[i] = b'0' + (n % 10) as u8;
            n /= 10;
            if n == 0 {
                break;
            }
        }
        if v < 0 {
            i -= 1;
            digits[i] = b'-';
        }

        self.put(&digits[i..])
    }

    fn put_value(&mut self, value: &Value) -> CodecResult<()> {
        match value {
            Value::ObjectId(oid) => {
                self.put_byte(b'"')?;
                self.put(&oid.to_hex_bytes())?;
                self.put_byte(b'"')
            }
            Value::Boolean(true) => self.put(b"true"),
            Value::Boolean(false) => self.put(b"false"),
            Value::Int32(v) => self.put_int(*v),
            Value::String(s) => self.put_quoted(s),
            // Measure rejects these first; kept exhaustive for direct callers.
            other => Err(CodecError::UnsupportedType {
                field: String::new(),
                type_name: other.type_name(),
            }),
        }
    }
}

/// Write `doc` into `buf` followed by a terminator byte.
///
/// Returns the number of JSON bytes written, not counting the terminator.
pub fn encode_into(doc: &Document, buf: &mut [u8]) -> CodecResult<usize> {
    let mut w = SliceWriter::new(buf);
    w.put_byte(b'{')?;

    let mut fields = doc.iter().peekable();
    while let Some((key, value)) = fields.next() {
        if !value.is_renderable() {
            // Same error, with the field name, as the measure pass
            value_width(key, value)?;
        }

        w.put_quoted(key)?;
        w.put_byte(b':')?;
        w.put_value(value)?;

        if fields.peek().is_some() {
            w.put_byte(b',')?;
        }
    }

    w.put_byte(b'}')?;
    let written = w.pos;
    w.put_byte(TERMINATOR)?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bson::ObjectId;

    fn render(doc: &Document, capacity: usize) -> CodecResult<String> {
        let mut buf = vec![0xffu8; capacity];
        let n = encode_into(doc, &mut buf)?;
        assert_eq!(buf[n], TERMINATOR);
        Ok(String::from_utf8(buf[..n].to_vec()).unwrap())
    }

    #[test]
    fn test_write_all_types() {
        let oid = ObjectId::parse_hex("507f1f77bcf86cd799439011").unwrap();
        let doc = Document::new()
            .with("_id", oid)
            .with("live", true)
            .with("n", -42)
            .with("name", "ada");

        assert_eq!(
            render(&doc, 128).unwrap(),
            r#"{"_id":"507f1f77bcf86cd799439011","live":true,"n":-42,"name":"ada"}"#
        );
    }

    #[test]
    fn test_write_empty_document() {
        assert_eq!(render(&Document::new(), 3).unwrap(), "{}");
    }

    #[test]
    fn test_write_escapes() {
        let doc = Document::new().with("q\"k", "line\nbreak\u{2}");
        assert_eq!(
            render(&doc, 64).unwrap(),
            r#"{"q\"k":"line\nbreak\u0002"}"#
        );
    }

    #[test]
    fn test_write_int_extremes() {
        let doc = Document::new().with("lo", i32::MIN).with("hi", i32::MAX).with("z", 0);
        assert_eq!(
            render(&doc, 64).unwrap(),
            r#"{"lo":-2147483648,"hi":2147483647,"z":0}"#
        );
    }

    #[test]
    fn test_overflow_is_reported() {
        let doc = Document::new().with("name", "ada");
        let err = render(&doc, 8).unwrap_err();
        assert!(matches!(err, CodecError::BufferOverflow { capacity: 8, .. }));
    }
}
