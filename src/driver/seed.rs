//! # Memory Seed Files
//!
//! JSON description of the initial contents of a [`MemoryCluster`]:
//!
//! ```json
//! {
//!   "replica_set": "rs0",
//!   "users": [{ "db": "app", "user": "svc", "pass": "s3cret" }],
//!   "require_auth": ["app"],
//!   "collections": {
//!     "app.fs": [{ "_id": { "$oid": "507f1f77bcf86cd799439011" }, "name": "a" }]
//!   }
//! }
//! ```
//!
//! Integers that fit in 32 bits become `Int32`, larger ones `Int64`,
//! fractional numbers `Double`. `{"$oid": "<24 hex>"}` becomes an object id.
//! Fields keep the order they have in the file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value as Json;

use crate::bson::{Document, ObjectId, Value};

use super::errors::{DriverError, DriverResult};
use super::memory::MemoryCluster;
use super::Namespace;

#[derive(Debug, Deserialize)]
struct SeedUser {
    db: String,
    user: String,
    pass: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MemorySeed {
    replica_set: Option<String>,
    users: Vec<SeedUser>,
    require_auth: Vec<String>,
    collections: BTreeMap<String, Vec<serde_json::Map<String, Json>>>,
}

impl MemorySeed {
    pub fn load(path: &Path) -> DriverResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| DriverError::Seed(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> DriverResult<Self> {
        serde_json::from_str(content).map_err(|e| DriverError::Seed(format!("invalid JSON: {}", e)))
    }

    /// Build a cluster holding the seeded users and documents
    pub fn into_cluster(self) -> DriverResult<Arc<MemoryCluster>> {
        let cluster = MemoryCluster::new();

        if let Some(name) = self.replica_set {
            cluster.set_replica_set(name);
        }
        for u in &self.users {
            cluster.add_user(&u.db, &u.user, &u.pass);
        }
        for db in &self.require_auth {
            cluster.require_auth(db);
        }

        for (ns, docs) in self.collections {
            let (database, collection) = ns
                .split_once('.')
                .filter(|(d, c)| !d.is_empty() && !c.is_empty())
                .ok_or_else(|| DriverError::Seed(format!("namespace {:?} is not db.collection", ns)))?;
            let namespace = Namespace::new(database, collection);

            for fields in docs {
                let mut doc = Document::new();
                for (key, json) in fields {
                    let value = json_to_value(&key, json)?;
                    doc.insert(key, value);
                }
                cluster.insert(&namespace, doc);
            }
        }

        Ok(cluster)
    }
}

fn json_to_value(field: &str, json: Json) -> DriverResult<Value> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Boolean(b)),
        Json::String(s) => Ok(Value::String(s)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i32::try_from(i).map(Value::Int32).unwrap_or(Value::Int64(i)))
            } else {
                n.as_f64()
                    .map(Value::Double)
                    .ok_or_else(|| DriverError::Seed(format!("field {:?}: number out of range", field)))
            }
        }
        Json::Object(map) => match map.get("$oid").and_then(Json::as_str) {
            Some(hex) if map.len() == 1 => ObjectId::parse_hex(hex)
                .map(Value::ObjectId)
                .map_err(|e| DriverError::Seed(format!("field {:?}: {}", field, e))),
            _ => Err(DriverError::Seed(format!(
                "field {:?}: nested documents are not supported",
                field
            ))),
        },
        Json::Array(_) => Err(DriverError::Seed(format!(
            "field {:?}: arrays are not supported",
            field
        ))),
    }
}
