//! # Key Extraction
//!
//! The key is the raw URI path after the location prefix, percent-decoded.
//! Decoding is all or nothing: a truncated or non-hex escape rejects the
//! request instead of yielding a partial key.

use super::errors::{GatewayError, GatewayResult};

/// Return the part of `uri_path` after `location`.
///
/// Fails if the path is shorter than the prefix it was routed by.
pub fn extract_key<'a>(location: &str, uri_path: &'a str) -> GatewayResult<&'a str> {
    if uri_path.len() < location.len() {
        return Err(GatewayError::InvalidLocation {
            location: location.to_string(),
            uri: uri_path.to_string(),
        });
    }
    uri_path
        .get(location.len()..)
        .ok_or_else(|| GatewayError::InvalidLocation {
            location: location.to_string(),
            uri: uri_path.to_string(),
        })
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode `%xy` escapes. `+` is not treated as a space.
pub fn percent_decode(input: &[u8]) -> GatewayResult<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        if input[i] != b'%' {
            out.push(input[i]);
            i += 1;
            continue;
        }

        let hi = input.get(i + 1).copied().and_then(hex_value);
        let lo = input.get(i + 2).copied().and_then(hex_value);
        match (hi, lo) {
            (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
            _ => {
                let end = (i + 3).min(input.len());
                return Err(GatewayError::BadRequest(format!(
                    "malformed escape {:?} at offset {}",
                    String::from_utf8_lossy(&input[i..end]),
                    i
                )));
            }
        }
        i += 3;
    }

    Ok(out)
}

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

/// Encode every byte outside the RFC 3986 unreserved set.
pub fn percent_encode(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX_UPPER[(b >> 4) as usize] as char);
            out.push(HEX_UPPER[(b & 0x0f) as usize] as char);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_key() {
        assert_eq!(extract_key("/docs/", "/docs/abc").unwrap(), "abc");
        assert_eq!(extract_key("/docs/", "/docs/").unwrap(), "");
        assert_eq!(extract_key("/docs/", "/docs/a/b").unwrap(), "a/b");
    }

    #[test]
    fn test_extract_key_short_uri() {
        assert!(matches!(
            extract_key("/docs/", "/doc"),
            Err(GatewayError::InvalidLocation { .. })
        ));
    }

    #[test]
    fn test_decode() {
        assert_eq!(percent_decode(b"a%20b").unwrap(), b"a b");
        assert_eq!(percent_decode(b"%2f%2F").unwrap(), b"//");
        assert_eq!(percent_decode(b"a+b").unwrap(), b"a+b");
        assert_eq!(percent_decode(b"%00").unwrap(), vec![0u8]);
        assert_eq!(percent_decode(b"").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for bad in [&b"%"[..], b"abc%", b"abc%4", b"%zz", b"%4g", b"%g4"] {
            assert!(
                matches!(percent_decode(bad), Err(GatewayError::BadRequest(_))),
                "{:?} should be rejected",
                String::from_utf8_lossy(bad)
            );
        }
    }

    #[test]
    fn test_encode() {
        assert_eq!(percent_encode(b"report 1.pdf"), "report%201.pdf");
        assert_eq!(percent_encode(b"a/b%"), "a%2Fb%25");
        assert_eq!(percent_encode(&[0xff, 0x00]), "%FF%00");
    }

    #[test]
    fn test_roundtrip_all_bytes() {
        let all: Vec<u8> = (0..=255).collect();
        assert_eq!(percent_decode(percent_encode(&all).as_bytes()).unwrap(), all);
    }
}
