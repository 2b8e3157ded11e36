//! # Location Configuration
//!
//! One gateway location: the URL prefix it serves, the collection behind it,
//! how its key is typed, and which logical connection carries its traffic.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::driver::{Namespace, ServerAddress, DEFAULT_PORT};
use crate::query::KeyType;

use super::errors::{ConfigError, ConfigResult};

/// Default collection when none is configured
pub const DEFAULT_ROOT_COLLECTION: &str = "fs";

/// Default key field
pub const DEFAULT_KEY_FIELD: &str = "_id";

/// Default logical connection name
pub const DEFAULT_CONNECTION: &str = "127.0.0.1:27017";

/// Key field that only supports string keys
pub const FILENAME_FIELD: &str = "filename";

/// Most server addresses a single connection may list
pub const MAX_SERVERS: usize = 8;

/// Database user and password
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub user: String,
    #[serde(skip_serializing)]
    pub pass: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

/// Location block as written in the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawLocation {
    pub location: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub root_collection: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default, rename = "type")]
    pub key_type: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub pass: Option<String>,
    #[serde(default)]
    pub connection: Option<String>,
    #[serde(default)]
    pub servers: Option<Vec<String>>,
    #[serde(default)]
    pub replica_set: Option<String>,
}

/// Resolved, validated location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationConfig {
    /// URL prefix; the key is whatever follows it
    pub location: String,
    pub database: String,
    pub root_collection: String,
    pub key_field: String,
    pub key_type: KeyType,
    pub credentials: Option<Credentials>,
    /// Logical connection name shared by locations using the same servers
    pub connection: String,
    pub servers: Vec<ServerAddress>,
    pub replica_set: Option<String>,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

impl LocationConfig {
    /// A location with every optional setting at its default
    pub fn new(location: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            database: database.into(),
            root_collection: DEFAULT_ROOT_COLLECTION.to_string(),
            key_field: DEFAULT_KEY_FIELD.to_string(),
            key_type: KeyType::default(),
            credentials: None,
            connection: DEFAULT_CONNECTION.to_string(),
            servers: vec![ServerAddress::new("127.0.0.1", DEFAULT_PORT)],
            replica_set: None,
        }
    }

    pub fn with_key(mut self, field: impl Into<String>, key_type: KeyType) -> Self {
        self.key_field = field.into();
        self.key_type = key_type;
        self
    }

    pub fn with_root_collection(mut self, collection: impl Into<String>) -> Self {
        self.root_collection = collection.into();
        self
    }

    pub fn with_credentials(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(user, pass));
        self
    }

    pub fn with_connection(
        mut self,
        name: impl Into<String>,
        servers: Vec<ServerAddress>,
        replica_set: Option<String>,
    ) -> Self {
        self.connection = name.into();
        self.servers = servers;
        self.replica_set = replica_set;
        self
    }

    /// Collection the location reads and removes from
    pub fn namespace(&self) -> Namespace {
        Namespace::new(&self.database, &self.root_collection)
    }

    /// Resolve defaults and validate a raw block.
    pub fn resolve(raw: &RawLocation) -> ConfigResult<Self> {
        let location = raw.location.clone();
        let mut resolved = Self::new(location.clone(), raw.database.clone());

        if let Some(collection) = non_empty(&raw.root_collection) {
            resolved.root_collection = collection.to_string();
        }
        if let Some(field) = non_empty(&raw.field) {
            resolved.key_field = field.to_string();
        }

        resolved.key_type = match non_empty(&raw.key_type) {
            Some(t) => t.parse().map_err(|_| ConfigError::UnsupportedKeyType {
                location: location.clone(),
                value: t.to_string(),
            })?,
            None if resolved.key_field == FILENAME_FIELD => KeyType::String,
            None => KeyType::default(),
        };

        resolved.credentials = match (non_empty(&raw.user), non_empty(&raw.pass)) {
            (Some(user), Some(pass)) => Some(Credentials::new(user, pass)),
            (None, None) => None,
            (None, Some(_)) => return Err(ConfigError::PasswordWithoutUser { location }),
            (Some(_), None) => return Err(ConfigError::UserWithoutPassword { location }),
        };

        if let Some(name) = non_empty(&raw.connection) {
            resolved.connection = name.to_string();
        }
        if let Some(servers) = &raw.servers {
            resolved.servers = servers
                .iter()
                .map(|s| {
                    ServerAddress::parse(s).map_err(|source| ConfigError::InvalidServer {
                        location: location.clone(),
                        source,
                    })
                })
                .collect::<ConfigResult<Vec<_>>>()?;
        }
        resolved.replica_set = non_empty(&raw.replica_set).map(str::to_string);

        resolved.validate()?;
        Ok(resolved)
    }

    /// Check the invariants of a resolved location.
    pub fn validate(&self) -> ConfigResult<()> {
        let location = || self.location.clone();

        if !self.location.starts_with('/') {
            return Err(ConfigError::InvalidLocation(location()));
        }
        if self.database.is_empty() {
            return Err(ConfigError::MissingDatabase { location: location() });
        }
        if self.key_field == FILENAME_FIELD && self.key_type != KeyType::String {
            return Err(ConfigError::FilenameRequiresString { location: location() });
        }

        let count = self.servers.len();
        match (count, &self.replica_set) {
            (0, _) => return Err(ConfigError::ServerCount { location: location(), count }),
            (1, Some(_)) => return Err(ConfigError::UnexpectedReplicaSet { location: location() }),
            (1, None) => {}
            (2..=MAX_SERVERS, Some(_)) => {}
            (2..=MAX_SERVERS, None) => {
                return Err(ConfigError::MissingReplicaSet { location: location(), count })
            }
            _ => return Err(ConfigError::ServerCount { location: location(), count }),
        }

        Ok(())
    }
}
