//! # Database Driver Contract
//!
//! The calls the gateway makes against a document database session. Wire
//! encoding is the driver's business; the gateway only relies on the
//! call/return contracts below.
//!
//! `memory` implements the contract in-process. It backs the CLI's
//! development mode and the test suite.

pub mod errors;
pub mod memory;
pub mod seed;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bson::Document;
use crate::query::Query;

pub use errors::{ConnectStatus, DriverError, DriverResult};
pub use memory::{AuthAttempt, MemoryCluster, MemoryDriver};
pub use seed::MemorySeed;

/// Port used when a server address omits one
pub const DEFAULT_PORT: u16 = 27017;

/// A database server address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

/// Failure to parse `host[:port]`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("empty host in server address {0:?}")]
    EmptyHost(String),

    #[error("invalid port in server address {0:?}")]
    InvalidPort(String),
}

impl ServerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host`, `host:port`, `[v6]` or `[v6]:port`.
    pub fn parse(s: &str) -> Result<Self, AddressParseError> {
        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| AddressParseError::EmptyHost(s.to_string()))?;
            match tail {
                "" => (host, None),
                _ => match tail.strip_prefix(':') {
                    Some(port) => (host, Some(port)),
                    None => return Err(AddressParseError::InvalidPort(s.to_string())),
                },
            }
        } else {
            match s.split_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (s, None),
            }
        };

        if host.is_empty() {
            return Err(AddressParseError::EmptyHost(s.to_string()));
        }

        let port = match port {
            None => DEFAULT_PORT,
            Some(p) => match p.parse::<u16>() {
                Ok(port) if port != 0 => port,
                _ => return Err(AddressParseError::InvalidPort(s.to_string())),
            },
        };

        Ok(Self::new(host, port))
    }
}

impl FromStr for ServerAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// A `database.collection` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Result cursor of a `find`
pub trait Cursor {
    /// Advance to the next matching document, `None` once exhausted.
    fn advance(&mut self) -> DriverResult<Option<Document>>;
}

/// One database session
///
/// A session is used by one request at a time; callers serialize access.
pub trait Driver: Send {
    /// Open a direct connection to a single server.
    fn connect(&mut self, addr: &ServerAddress) -> DriverResult<()>;

    /// Open a replica-set connection from a seed list.
    fn replica_set_connect(&mut self, set_name: &str, seeds: &[ServerAddress]) -> DriverResult<()>;

    /// Re-open the connection to the previously connected target.
    ///
    /// Authentication does not survive a reconnect.
    fn reconnect(&mut self) -> DriverResult<()>;

    /// Close the connection. Idempotent.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Run the authentication command. `true` on success.
    fn authenticate(&mut self, db: &str, user: &str, pass: &str) -> bool;

    /// Open a cursor over documents matching `query`; `None` matches everything.
    fn find<'a>(
        &'a mut self,
        ns: &Namespace,
        query: Option<&Query>,
    ) -> DriverResult<Box<dyn Cursor + 'a>>;

    /// Remove one document matching `query`.
    fn remove(&mut self, ns: &Namespace, query: &Query) -> DriverResult<()>;

    /// Error left by the last operation against `db`, if any.
    fn last_error(&mut self, db: &str) -> Option<String>;
}

/// Cursor over an already materialized result set
pub struct VecCursor {
    docs: std::vec::IntoIter<Document>,
}

impl VecCursor {
    pub fn new(docs: Vec<Document>) -> Self {
        Self {
            docs: docs.into_iter(),
        }
    }
}

impl Cursor for VecCursor {
    fn advance(&mut self) -> DriverResult<Option<Document>> {
        Ok(self.docs.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(
            ServerAddress::parse("db1").unwrap(),
            ServerAddress::new("db1", 27017)
        );
        assert_eq!(
            ServerAddress::parse("10.0.0.5:27018").unwrap(),
            ServerAddress::new("10.0.0.5", 27018)
        );
        assert_eq!(
            ServerAddress::parse("[::1]:27019").unwrap(),
            ServerAddress::new("::1", 27019)
        );
        assert_eq!(ServerAddress::new("::1", 1).to_string(), "[::1]:1");
    }

    #[test]
    fn test_parse_address_rejects() {
        assert!(ServerAddress::parse("").is_err());
        assert!(ServerAddress::parse(":27017").is_err());
        assert!(ServerAddress::parse("db:").is_err());
        assert!(ServerAddress::parse("db:0").is_err());
        assert!(ServerAddress::parse("db:99999").is_err());
        assert!(ServerAddress::parse("[::1]x").is_err());
    }

    #[test]
    fn test_namespace_display() {
        assert_eq!(Namespace::new("app", "fs").to_string(), "app.fs");
    }

    #[test]
    fn test_vec_cursor() {
        let mut cursor = VecCursor::new(vec![Document::new().with("a", 1)]);
        assert!(cursor.advance().unwrap().is_some());
        assert!(cursor.advance().unwrap().is_none());
    }
}
