//! # Query Builder
//!
//! Turns the decoded URL key into a single-field equality query typed by the
//! location's configured key type.

pub mod errors;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::bson::{Document, ObjectId, Value};

pub use errors::{BuildError, BuildResult};

/// How a location interprets its key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// 24 hex characters → 12-byte object id
    #[default]
    ObjectId,
    /// Decimal 32-bit integer
    Int,
    /// Verbatim string
    String,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::ObjectId => "objectid",
            KeyType::Int => "int",
            KeyType::String => "string",
        }
    }
}

impl FromStr for KeyType {
    type Err = BuildError;

    /// Case-insensitive: `objectid`, `int`, `string`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("objectid") {
            Ok(KeyType::ObjectId)
        } else if s.eq_ignore_ascii_case("int") {
            Ok(KeyType::Int)
        } else if s.eq_ignore_ascii_case("string") {
            Ok(KeyType::String)
        } else {
            Err(BuildError::UnsupportedKeyType(s.to_string()))
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed key value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValue {
    ObjectId(ObjectId),
    Int(i32),
    String(String),
}

impl KeyValue {
    /// Whether a stored value is equal to this key
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (KeyValue::ObjectId(a), Value::ObjectId(b)) => a == b,
            (KeyValue::Int(a), Value::Int32(b)) => a == b,
            (KeyValue::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl From<KeyValue> for Value {
    fn from(key: KeyValue) -> Self {
        match key {
            KeyValue::ObjectId(oid) => Value::ObjectId(oid),
            KeyValue::Int(v) => Value::Int32(v),
            KeyValue::String(s) => Value::String(s),
        }
    }
}

/// Single-field equality query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    field: String,
    value: KeyValue,
}

impl Query {
    pub fn eq(field: impl Into<String>, value: KeyValue) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &KeyValue {
        &self.value
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.field)
            .map(|v| self.value.matches(v))
            .unwrap_or(false)
    }
}

/// Builds queries from decoded URL keys
pub struct QueryBuilder;

impl QueryBuilder {
    /// Build an equality query on `field` from the already percent-decoded key.
    ///
    /// Integer keys accept an optional leading `-` followed by ASCII digits
    /// and must fit in 32 bits.
    pub fn build(key_type: KeyType, field: &str, raw: &[u8]) -> BuildResult<Query> {
        let text = std::str::from_utf8(raw).map_err(|_| BuildError::InvalidUtf8)?;

        let value = match key_type {
            KeyType::ObjectId => KeyValue::ObjectId(ObjectId::parse_hex(text)?),
            KeyType::Int => KeyValue::Int(parse_int(text)?),
            KeyType::String => KeyValue::String(text.to_string()),
        };

        Ok(Query::eq(field, value))
    }
}

fn parse_int(text: &str) -> BuildResult<i32> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BuildError::InvalidInteger(text.to_string()));
    }

    text.parse::<i32>()
        .map_err(|_| BuildError::InvalidInteger(text.to_string()))
}
