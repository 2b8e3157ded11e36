//! # In-Process Backend
//!
//! A [`MemoryCluster`] holds collections, users and failure switches shared by
//! any number of [`MemoryDriver`] sessions. Sessions observe the cluster the
//! way a network client observes a server: connections can be severed,
//! authentication is per session and lost on reconnect, and operations
//! against a database that requires authentication fail until the session
//! has authenticated against it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::bson::Document;
use crate::query::Query;

use super::errors::{ConnectStatus, DriverError, DriverResult};
use super::{Cursor, Driver, Namespace, ServerAddress, VecCursor};

/// Error reported by `last_error` after an unauthenticated operation
pub const UNAUTHORIZED: &str = "unauthorized";

/// A recorded authentication command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthAttempt {
    pub db: String,
    pub user: String,
    pub success: bool,
}

#[derive(Debug)]
struct StoredUser {
    user: String,
    digest: [u8; 32],
}

#[derive(Debug, Default)]
struct ClusterState {
    /// `None` means every host answers
    reachable: Option<HashSet<ServerAddress>>,
    replica_set: Option<String>,
    refuse_connections: bool,
    fail_removes: bool,

    /// Bumped to sever every open session
    generation: u64,

    collections: HashMap<String, Vec<Document>>,
    users: HashMap<String, Vec<StoredUser>>,
    auth_required: HashSet<String>,
    auth_log: Vec<AuthAttempt>,
}

/// Shared in-process database
#[derive(Debug, Default)]
pub struct MemoryCluster {
    state: RwLock<ClusterState>,
}

fn password_digest(db: &str, user: &str, pass: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(db.as_bytes());
    hasher.update([0]);
    hasher.update(user.as_bytes());
    hasher.update([0]);
    hasher.update(pass.as_bytes());

    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

impl MemoryCluster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // Test switches must keep working after a panicking test thread.
    fn read(&self) -> RwLockReadGuard<'_, ClusterState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ClusterState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new, unconnected session
    pub fn session(self: &Arc<Self>) -> MemoryDriver {
        MemoryDriver::new(Arc::clone(self))
    }

    // ==================
    // Topology
    // ==================

    pub fn set_replica_set(&self, name: impl Into<String>) {
        self.write().replica_set = Some(name.into());
    }

    /// Restrict which addresses answer. `None` makes every address reachable.
    pub fn set_reachable(&self, hosts: Option<Vec<ServerAddress>>) {
        self.write().reachable = hosts.map(|h| h.into_iter().collect());
    }

    /// Make every connect and reconnect fail
    pub fn refuse_connections(&self, refuse: bool) {
        self.write().refuse_connections = refuse;
    }

    /// Drop every open session's connection
    pub fn sever_connections(&self) {
        let mut state = self.write();
        state.generation += 1;
        tracing::debug!(generation = state.generation, "memory cluster severed all sessions");
    }

    fn generation(&self) -> u64 {
        self.read().generation
    }

    // ==================
    // Users
    // ==================

    pub fn add_user(&self, db: &str, user: &str, pass: &str) {
        let digest = password_digest(db, user, pass);
        let mut state = self.write();
        let users = state.users.entry(db.to_string()).or_default();
        users.retain(|u| u.user != user);
        users.push(StoredUser {
            user: user.to_string(),
            digest,
        });
    }

    /// Operations against `db` fail until the session authenticates
    pub fn require_auth(&self, db: &str) {
        self.write().auth_required.insert(db.to_string());
    }

    /// Every authentication command seen so far, oldest first
    pub fn auth_attempts(&self) -> Vec<AuthAttempt> {
        self.read().auth_log.clone()
    }

    fn check_credentials(&self, db: &str, user: &str, pass: &str) -> bool {
        let digest = password_digest(db, user, pass);
        let mut state = self.write();
        let success = state
            .users
            .get(db)
            .and_then(|users| users.iter().find(|u| u.user == user))
            .map(|u| bool::from(u.digest.ct_eq(&digest)))
            .unwrap_or(false);

        state.auth_log.push(AuthAttempt {
            db: db.to_string(),
            user: user.to_string(),
            success,
        });
        success
    }

    fn requires_auth(&self, db: &str) -> bool {
        self.read().auth_required.contains(db)
    }

    // ==================
    // Data
    // ==================

    pub fn insert(&self, ns: &Namespace, doc: Document) {
        self.write()
            .collections
            .entry(ns.to_string())
            .or_default()
            .push(doc);
    }

    /// Snapshot of a collection, in insertion order
    pub fn documents(&self, ns: &Namespace) -> Vec<Document> {
        self.read()
            .collections
            .get(&ns.to_string())
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, ns: &Namespace) -> usize {
        self.read()
            .collections
            .get(&ns.to_string())
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Make every remove fail
    pub fn fail_removes(&self, fail: bool) {
        self.write().fail_removes = fail;
    }

    fn find_matching(&self, ns: &Namespace, query: Option<&Query>) -> Vec<Document> {
        self.read()
            .collections
            .get(&ns.to_string())
            .map(|docs| {
                docs.iter()
                    .filter(|d| query.map(|q| q.matches(d)).unwrap_or(true))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn remove_first(&self, ns: &Namespace, query: &Query) -> DriverResult<()> {
        let mut state = self.write();
        if state.fail_removes {
            return Err(DriverError::Operation("remove rejected by server".to_string()));
        }
        if let Some(docs) = state.collections.get_mut(&ns.to_string()) {
            if let Some(pos) = docs.iter().position(|d| query.matches(d)) {
                docs.remove(pos);
            }
        }
        Ok(())
    }

    // ==================
    // Connection checks
    // ==================

    fn check_direct(&self, addr: &ServerAddress) -> DriverResult<()> {
        let state = self.read();
        if state.refuse_connections {
            return Err(DriverError::Connect(ConnectStatus::ConnectionFailure));
        }
        match &state.reachable {
            Some(hosts) if !hosts.contains(addr) => {
                Err(DriverError::Connect(ConnectStatus::ConnectionFailure))
            }
            _ => Ok(()),
        }
    }

    fn check_replica_set(&self, set_name: &str, seeds: &[ServerAddress]) -> DriverResult<()> {
        let state = self.read();
        if state.refuse_connections {
            return Err(DriverError::Connect(ConnectStatus::ConnectionFailure));
        }
        if state.replica_set.as_deref() != Some(set_name) {
            return Err(DriverError::Connect(ConnectStatus::BadSetName));
        }
        let any_reachable = match &state.reachable {
            Some(hosts) => seeds.iter().any(|s| hosts.contains(s)),
            None => !seeds.is_empty(),
        };
        if !any_reachable {
            return Err(DriverError::Connect(ConnectStatus::NoPrimary));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Target {
    Direct(ServerAddress),
    ReplicaSet {
        name: String,
        seeds: Vec<ServerAddress>,
    },
}

/// A session against a [`MemoryCluster`]
#[derive(Debug)]
pub struct MemoryDriver {
    cluster: Arc<MemoryCluster>,
    target: Option<Target>,
    /// Cluster generation this session connected under
    connected_at: Option<u64>,
    authenticated: HashSet<String>,
    last_error: Option<(String, String)>,
}

impl MemoryDriver {
    pub fn new(cluster: Arc<MemoryCluster>) -> Self {
        Self {
            cluster,
            target: None,
            connected_at: None,
            authenticated: HashSet::new(),
            last_error: None,
        }
    }

    pub fn cluster(&self) -> &Arc<MemoryCluster> {
        &self.cluster
    }

    fn open(&mut self, target: &Target) -> DriverResult<()> {
        match target {
            Target::Direct(addr) => self.cluster.check_direct(addr)?,
            Target::ReplicaSet { name, seeds } => self.cluster.check_replica_set(name, seeds)?,
        }
        self.connected_at = Some(self.cluster.generation());
        self.authenticated.clear();
        self.last_error = None;
        Ok(())
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(DriverError::NotConnected)
        }
    }

    fn authorized(&mut self, db: &str) -> bool {
        if self.cluster.requires_auth(db) && !self.authenticated.contains(db) {
            self.last_error = Some((db.to_string(), UNAUTHORIZED.to_string()));
            false
        } else {
            self.last_error = None;
            true
        }
    }
}

impl Driver for MemoryDriver {
    fn connect(&mut self, addr: &ServerAddress) -> DriverResult<()> {
        let target = Target::Direct(addr.clone());
        self.open(&target)?;
        self.target = Some(target);
        Ok(())
    }

    fn replica_set_connect(&mut self, set_name: &str, seeds: &[ServerAddress]) -> DriverResult<()> {
        let target = Target::ReplicaSet {
            name: set_name.to_string(),
            seeds: seeds.to_vec(),
        };
        self.open(&target)?;
        self.target = Some(target);
        Ok(())
    }

    fn reconnect(&mut self) -> DriverResult<()> {
        let target = self
            .target
            .clone()
            .ok_or(DriverError::Connect(ConnectStatus::ConnectionFailure))?;
        self.open(&target)
    }

    fn disconnect(&mut self) {
        self.connected_at = None;
        self.authenticated.clear();
    }

    fn is_connected(&self) -> bool {
        self.connected_at == Some(self.cluster.generation())
    }

    fn authenticate(&mut self, db: &str, user: &str, pass: &str) -> bool {
        if !self.is_connected() {
            return false;
        }
        let ok = self.cluster.check_credentials(db, user, pass);
        if ok {
            self.authenticated.insert(db.to_string());
        }
        ok
    }

    fn find<'a>(
        &'a mut self,
        ns: &Namespace,
        query: Option<&Query>,
    ) -> DriverResult<Box<dyn Cursor + 'a>> {
        self.ensure_open()?;
        if !self.authorized(&ns.database) {
            // Like a server reply with the error flag set: no documents.
            return Ok(Box::new(VecCursor::new(Vec::new())));
        }
        Ok(Box::new(VecCursor::new(self.cluster.find_matching(ns, query))))
    }

    fn remove(&mut self, ns: &Namespace, query: &Query) -> DriverResult<()> {
        self.ensure_open()?;
        if !self.authorized(&ns.database) {
            return Err(DriverError::Operation(UNAUTHORIZED.to_string()));
        }
        self.cluster.remove_first(ns, query)
    }

    fn last_error(&mut self, db: &str) -> Option<String> {
        match &self.last_error {
            Some((err_db, msg)) if err_db == db => Some(msg.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::KeyValue;

    fn addr() -> ServerAddress {
        ServerAddress::new("127.0.0.1", 27017)
    }

    #[test]
    fn test_connect_and_sever() {
        let cluster = MemoryCluster::new();
        let mut session = cluster.session();
        assert!(!session.is_connected());

        session.connect(&addr()).unwrap();
        assert!(session.is_connected());

        cluster.sever_connections();
        assert!(!session.is_connected());

        session.reconnect().unwrap();
        assert!(session.is_connected());
    }

    #[test]
    fn test_unreachable_host() {
        let cluster = MemoryCluster::new();
        cluster.set_reachable(Some(vec![ServerAddress::new("db1", 27017)]));
        let mut session = cluster.session();
        assert_eq!(
            session.connect(&addr()),
            Err(DriverError::Connect(ConnectStatus::ConnectionFailure))
        );
    }

    #[test]
    fn test_replica_set_name_mismatch() {
        let cluster = MemoryCluster::new();
        cluster.set_replica_set("rs0");
        let mut session = cluster.session();
        let seeds = vec![ServerAddress::new("a", 1), ServerAddress::new("b", 2)];

        assert_eq!(
            session.replica_set_connect("rs1", &seeds),
            Err(DriverError::Connect(ConnectStatus::BadSetName))
        );
        assert!(session.replica_set_connect("rs0", &seeds).is_ok());
    }

    #[test]
    fn test_reconnect_without_target() {
        let cluster = MemoryCluster::new();
        let mut session = cluster.session();
        assert!(session.reconnect().is_err());
    }

    #[test]
    fn test_auth_required_and_lost_on_reconnect() {
        let cluster = MemoryCluster::new();
        cluster.add_user("app", "svc", "s3cret");
        cluster.require_auth("app");
        let ns = Namespace::new("app", "test");

        let mut session = cluster.session();
        session.connect(&addr()).unwrap();

        session.find(&ns, None).unwrap().advance().unwrap();
        assert_eq!(session.last_error("app").as_deref(), Some(UNAUTHORIZED));

        assert!(!session.authenticate("app", "svc", "wrong"));
        assert!(session.authenticate("app", "svc", "s3cret"));
        session.find(&ns, None).unwrap();
        assert_eq!(session.last_error("app"), None);

        cluster.sever_connections();
        session.reconnect().unwrap();
        session.find(&ns, None).unwrap();
        assert!(session.last_error("app").is_some());

        let attempts = cluster.auth_attempts();
        assert_eq!(attempts.len(), 2);
        assert!(!attempts[0].success);
        assert!(attempts[1].success);
    }

    #[test]
    fn test_find_and_remove_first_match() {
        let cluster = MemoryCluster::new();
        let ns = Namespace::new("app", "fs");
        cluster.insert(&ns, Document::new().with("n", 1).with("v", "a"));
        cluster.insert(&ns, Document::new().with("n", 2));

        let mut session = cluster.session();
        session.connect(&addr()).unwrap();

        let q = Query::eq("n", KeyValue::Int(1));
        let hit = session.find(&ns, Some(&q)).unwrap().advance().unwrap();
        assert_eq!(hit.unwrap().get("v"), Some(&crate::bson::Value::from("a")));

        session.remove(&ns, &q).unwrap();
        assert_eq!(cluster.count(&ns), 1);
        assert!(session.find(&ns, Some(&q)).unwrap().advance().unwrap().is_none());
    }

    #[test]
    fn test_operations_require_connection() {
        let cluster = MemoryCluster::new();
        let mut session = cluster.session();
        let ns = Namespace::new("app", "fs");
        assert!(matches!(session.find(&ns, None), Err(DriverError::NotConnected)));
        assert!(!session.authenticate("app", "u", "p"));
    }
}
