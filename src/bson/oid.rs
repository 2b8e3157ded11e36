//! # Object Identifiers
//!
//! 12-byte binary document identifiers and their canonical 24-character
//! lowercase hex form.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of raw bytes in an object id
pub const OID_LEN: usize = 12;

/// Number of hex characters in the textual form
pub const OID_HEX_LEN: usize = OID_LEN * 2;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Failure to parse an object id from text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OidParseError {
    #[error("object id must be 24 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex character {0:?} in object id")]
    InvalidCharacter(char),
}

/// A 12-byte document identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OID_LEN]);

impl ObjectId {
    pub const fn from_bytes(bytes: [u8; OID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8; OID_LEN] {
        &self.0
    }

    /// Parse the 24-character hex form. Upper and lower case are accepted.
    pub fn parse_hex(s: &str) -> Result<Self, OidParseError> {
        let raw = s.as_bytes();
        if raw.len() != OID_HEX_LEN {
            return Err(OidParseError::InvalidLength(raw.len()));
        }

        let mut bytes = [0u8; OID_LEN];
        for (i, pair) in raw.chunks_exact(2).enumerate() {
            let hi = hex_value(pair[0])?;
            let lo = hex_value(pair[1])?;
            bytes[i] = (hi << 4) | lo;
        }

        Ok(Self(bytes))
    }

    /// Expand into lowercase hex digits.
    pub fn to_hex_bytes(&self) -> [u8; OID_HEX_LEN] {
        let mut out = [0u8; OID_HEX_LEN];
        for (i, byte) in self.0.iter().enumerate() {
            out[i * 2] = HEX_DIGITS[(byte >> 4) as usize];
            out[i * 2 + 1] = HEX_DIGITS[(byte & 0x0f) as usize];
        }
        out
    }

    pub fn to_hex(&self) -> String {
        // Hex digits are always ASCII
        self.to_hex_bytes().iter().map(|&b| b as char).collect()
    }
}

fn hex_value(c: u8) -> Result<u8, OidParseError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(OidParseError::InvalidCharacter(c as char)),
    }
}

impl FromStr for ObjectId {
    type Err = OidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
