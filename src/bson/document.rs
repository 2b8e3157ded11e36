//! # Documents
//!
//! Ordered field → value mappings as returned by the database driver.
//!
//! Field order is insertion order and is the traversal order used by every
//! consumer (the JSON codec relies on both of its passes seeing the same
//! order).

use super::oid::ObjectId;

/// A typed scalar stored in a document field
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    ObjectId(ObjectId),
    Boolean(bool),
    Int32(i32),
    String(String),

    // Types a driver may hand back that the gateway does not render.
    Int64(i64),
    Double(f64),
    Null,
    Binary(Vec<u8>),
}

impl Value {
    /// Type name as reported in logs and errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::ObjectId(_) => "objectid",
            Value::Boolean(_) => "bool",
            Value::Int32(_) => "int",
            Value::String(_) => "string",
            Value::Int64(_) => "long",
            Value::Double(_) => "double",
            Value::Null => "null",
            Value::Binary(_) => "binary",
        }
    }

    /// Whether the JSON codec can render this value
    pub fn is_renderable(&self) -> bool {
        matches!(
            self,
            Value::ObjectId(_) | Value::Boolean(_) | Value::Int32(_) | Value::String(_)
        )
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Value::ObjectId(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// An ordered document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    fields: Vec<(String, Value)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, replacing the value in place if the key already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let doc = Document::new()
            .with("zeta", 1)
            .with("alpha", true)
            .with("mid", "x");

        let keys: Vec<&str> = doc.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut doc = Document::new().with("a", 1).with("b", 2);
        doc.insert("a", "one");

        assert_eq!(doc.len(), 2);
        assert_eq!(doc.iter().next(), Some(("a", &Value::String("one".into()))));
    }

    #[test]
    fn test_renderable_types() {
        assert!(Value::Int32(1).is_renderable());
        assert!(Value::Boolean(false).is_renderable());
        assert!(!Value::Double(1.5).is_renderable());
        assert!(!Value::Null.is_renderable());
        assert_eq!(Value::Int64(3).type_name(), "long");
    }
}
