//! # Connection Registry
//!
//! Process-wide table from logical connection name to connection record.
//! Built once by [`ConnectionRegistry::init`] before the server accepts
//! requests and torn down by [`ConnectionRegistry::shutdown`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::config::location::MAX_SERVERS;
use crate::config::LocationConfig;
use crate::driver::{Driver, ServerAddress};

use super::auth::Authenticator;
use super::errors::{ConnectionError, ConnectionResult, LifecycleResult};
use super::record::ConnectionRecord;

/// Opens a fresh, unconnected driver session
pub type DriverFactory = dyn Fn() -> Box<dyn Driver> + Send + Sync;

/// A record shared between requests; the mutex serializes its use
pub type SharedRecord = Arc<Mutex<ConnectionRecord>>;

/// Lock a record for the duration of one logical operation.
pub fn lock_record(record: &SharedRecord) -> ConnectionResult<MutexGuard<'_, ConnectionRecord>> {
    record.lock().map_err(|poisoned| {
        ConnectionError::Poisoned(poisoned.get_ref().name().to_string())
    })
}

/// Registry of named connections
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, SharedRecord>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect and authenticate every location, in configuration order.
    ///
    /// Any failure aborts initialization; no partially initialized registry
    /// is returned.
    pub fn init(locations: &[LocationConfig], factory: &DriverFactory) -> LifecycleResult<Self> {
        let registry = Self::new();

        for loc in locations {
            registry.register(&loc.connection, &loc.servers, loc.replica_set.as_deref(), factory)?;

            let shared = registry.lookup(&loc.connection)?;
            let mut record = lock_record(&shared)?;

            if let Some(creds) = &loc.credentials {
                Authenticator::authenticate(&mut record, &loc.database, &creds.user, &creds.pass)?;
            }
            Authenticator::verify(&mut record, &loc.database)?;

            tracing::debug!(
                location = %loc.location,
                connection = %loc.connection,
                namespace = %loc.namespace(),
                "location ready"
            );
        }

        tracing::info!(
            connections = registry.len(),
            locations = locations.len(),
            "connection registry initialized"
        );
        Ok(registry)
    }

    /// Open connection `name` unless it already exists.
    ///
    /// One address opens a direct connection, 2 to 8 addresses open a
    /// replica-set connection. Returns `false` if the name was already
    /// registered, in which case `servers` is ignored.
    pub fn register(
        &self,
        name: &str,
        servers: &[ServerAddress],
        replica_set: Option<&str>,
        factory: &DriverFactory,
    ) -> ConnectionResult<bool> {
        let mut connections = self
            .connections
            .write()
            .map_err(|_| ConnectionError::Poisoned(name.to_string()))?;

        if connections.contains_key(name) {
            tracing::debug!(connection = name, "connection already registered");
            return Ok(false);
        }

        let mut session = factory();
        let opened = match (servers, replica_set) {
            ([addr], _) => session.connect(addr),
            (seeds, Some(set)) if (2..=MAX_SERVERS).contains(&seeds.len()) => {
                session.replica_set_connect(set, seeds)
            }
            _ => {
                return Err(ConnectionError::Topology {
                    name: name.to_string(),
                    count: servers.len(),
                })
            }
        };

        if let Err(err) = opened {
            let err = ConnectionError::from_driver(name, err);
            tracing::error!(connection = name, error = %err, "connect failed");
            return Err(err);
        }

        tracing::info!(connection = name, servers = servers.len(), replica_set, "connected");
        connections.insert(
            name.to_string(),
            Arc::new(Mutex::new(ConnectionRecord::new(name, session))),
        );
        Ok(true)
    }

    /// Find connection `name`
    pub fn lookup(&self, name: &str) -> ConnectionResult<SharedRecord> {
        let connections = self
            .connections
            .read()
            .map_err(|_| ConnectionError::Poisoned(name.to_string()))?;

        connections
            .get(name)
            .cloned()
            .ok_or_else(|| ConnectionError::NotFound(name.to_string()))
    }

    /// Registered connection names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.connections.read() {
            Ok(connections) => connections.keys().cloned().collect(),
            Err(poisoned) => poisoned.get_ref().keys().cloned().collect(),
        };
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        match self.connections.read() {
            Ok(connections) => connections.len(),
            Err(poisoned) => poisoned.get_ref().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Disconnect and drop every connection.
    pub fn shutdown(&self) {
        let drained: Vec<(String, SharedRecord)> = match self.connections.write() {
            Ok(mut connections) => connections.drain().collect(),
            Err(poisoned) => poisoned.into_inner().drain().collect(),
        };

        for (name, shared) in drained {
            // A poisoned record still owns a session worth closing.
            let mut record = match shared.lock() {
                Ok(record) => record,
                Err(poisoned) => poisoned.into_inner(),
            };
            record.session.disconnect();
            tracing::debug!(connection = %name, "disconnected");
        }
        tracing::info!("connection registry shut down");
    }
}
