//! # Reconnector
//!
//! Bounded recovery of a dropped connection: disconnect, back off, make one
//! reconnect attempt, then replay the stored credentials.

use std::thread;
use std::time::Duration;

use crate::config::DEFAULT_RECONNECT_BACKOFF_MS;

use super::auth::Authenticator;
use super::errors::{ConnectionError, LifecycleResult};
use super::record::ConnectionRecord;

/// Reconnect policy
#[derive(Debug, Clone, Copy)]
pub struct Reconnector {
    backoff: Duration,
}

impl Default for Reconnector {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_RECONNECT_BACKOFF_MS))
    }
}

impl Reconnector {
    pub fn new(backoff: Duration) -> Self {
        Self { backoff }
    }

    /// Make sure `record` is connected and authenticated.
    ///
    /// Returns `Ok(false)` if it already was, `Ok(true)` after a successful
    /// reconnect and replay. Never attempts more than one reconnect.
    pub fn ensure_connected(&self, record: &mut ConnectionRecord) -> LifecycleResult<bool> {
        if record.session.is_connected() {
            return Ok(false);
        }

        tracing::warn!(
            connection = %record.name,
            backoff = ?self.backoff,
            "connection lost, reconnecting"
        );

        record.session.disconnect();
        thread::sleep(self.backoff);

        if let Err(err) = record.session.reconnect() {
            let err = ConnectionError::from_driver(&record.name, err);
            tracing::error!(connection = %record.name, error = %err, "reconnect failed");
            return Err(err.into());
        }

        if let Err(err) = Authenticator::replay(record) {
            // A half-authenticated session must not serve requests.
            record.session.disconnect();
            return Err(err.into());
        }

        tracing::info!(connection = %record.name, "reconnected");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{AuthError, LifecycleError};
    use crate::driver::{ConnectStatus, Driver, MemoryCluster, ServerAddress};

    fn record(cluster: &std::sync::Arc<MemoryCluster>) -> ConnectionRecord {
        let mut session = cluster.session();
        session.connect(&ServerAddress::new("127.0.0.1", 27017)).unwrap();
        ConnectionRecord::new("primary", Box::new(session))
    }

    #[test]
    fn test_connected_is_noop() {
        let cluster = MemoryCluster::new();
        let mut rec = record(&cluster);
        assert_eq!(Reconnector::new(Duration::ZERO).ensure_connected(&mut rec), Ok(false));
    }

    #[test]
    fn test_reconnect_and_replay() {
        let cluster = MemoryCluster::new();
        cluster.add_user("app", "svc", "pw");
        cluster.require_auth("app");
        let mut rec = record(&cluster);
        Authenticator::authenticate(&mut rec, "app", "svc", "pw").unwrap();

        cluster.sever_connections();
        assert!(!rec.is_connected());

        assert_eq!(Reconnector::new(Duration::ZERO).ensure_connected(&mut rec), Ok(true));
        assert!(rec.is_connected());
        assert!(Authenticator::verify(&mut rec, "app").is_ok());
    }

    #[test]
    fn test_reconnect_failure() {
        let cluster = MemoryCluster::new();
        let mut rec = record(&cluster);
        cluster.sever_connections();
        cluster.refuse_connections(true);

        let err = Reconnector::new(Duration::ZERO)
            .ensure_connected(&mut rec)
            .unwrap_err();
        assert_eq!(
            err,
            LifecycleError::Connection(ConnectionError::Connect {
                name: "primary".to_string(),
                status: ConnectStatus::ConnectionFailure
            })
        );
        assert!(!rec.is_connected());
    }

    #[test]
    fn test_replay_failure_leaves_disconnected() {
        let cluster = MemoryCluster::new();
        cluster.add_user("app", "svc", "pw");
        let mut rec = record(&cluster);
        Authenticator::authenticate(&mut rec, "app", "svc", "pw").unwrap();

        cluster.add_user("app", "svc", "rotated");
        cluster.sever_connections();

        let err = Reconnector::new(Duration::ZERO)
            .ensure_connected(&mut rec)
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Auth(AuthError::InvalidCredentials { .. })));
        assert!(!rec.is_connected());
    }

    #[test]
    fn test_backoff_is_applied() {
        let cluster = MemoryCluster::new();
        let mut rec = record(&cluster);
        cluster.sever_connections();

        let started = std::time::Instant::now();
        Reconnector::new(Duration::from_millis(20))
            .ensure_connected(&mut rec)
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
