//! Connection Lifecycle Tests
//!
//! Boot-time registration and authentication through the registry, then
//! loss and recovery of the shared connection:
//! - credentials replay in the order they were first accepted
//! - repeated recovery never duplicates credentials or touches data
//! - a rejected replay leaves the connection unusable until fixed

use std::sync::Arc;
use std::time::Duration;

use docrest::bson::Document;
use docrest::config::LocationConfig;
use docrest::connection::{
    lock_record, AuthError, ConnectionRegistry, DriverFactory, LifecycleError, Reconnector,
};
use docrest::driver::{AuthAttempt, Driver, MemoryCluster, Namespace};

const SHARED: &str = "127.0.0.1:27017";

// =============================================================================
// Helper Functions
// =============================================================================

fn factory(cluster: &Arc<MemoryCluster>) -> Box<DriverFactory> {
    let cluster = Arc::clone(cluster);
    Box::new(move || Box::new(cluster.session()) as Box<dyn Driver>)
}

fn cluster() -> Arc<MemoryCluster> {
    let cluster = MemoryCluster::new();
    cluster.add_user("billing", "bill", "b-pass");
    cluster.add_user("catalog", "cat", "c-pass");
    cluster.require_auth("billing");
    cluster.require_auth("catalog");
    cluster.insert(
        &Namespace::new("billing", "fs"),
        Document::new().with("invoice", 1),
    );
    cluster
}

/// Three locations over one connection; `/billing-2/` repeats a credential.
fn locations() -> Vec<LocationConfig> {
    vec![
        LocationConfig::new("/billing/", "billing").with_credentials("bill", "b-pass"),
        LocationConfig::new("/catalog/", "catalog").with_credentials("cat", "c-pass"),
        LocationConfig::new("/billing-2/", "billing").with_credentials("bill", "b-pass"),
    ]
}

fn attempt(db: &str, user: &str, success: bool) -> AuthAttempt {
    AuthAttempt {
        db: db.to_string(),
        user: user.to_string(),
        success,
    }
}

// =============================================================================
// Boot
// =============================================================================

#[test]
fn test_boot_authenticates_each_location() {
    let cluster = cluster();
    let registry = ConnectionRegistry::init(&locations(), &factory(&cluster)).unwrap();

    assert_eq!(registry.names(), vec![SHARED.to_string()]);
    assert_eq!(
        cluster.auth_attempts(),
        vec![
            attempt("billing", "bill", true),
            attempt("catalog", "cat", true),
            attempt("billing", "bill", true),
        ]
    );

    let shared = registry.lookup(SHARED).unwrap();
    let record = lock_record(&shared).unwrap();
    let stored: Vec<(&str, &str)> = record
        .credentials()
        .iter()
        .map(|c| (c.db(), c.user()))
        .collect();
    assert_eq!(stored, vec![("billing", "bill"), ("catalog", "cat")]);
}

#[test]
fn test_boot_rejects_wrong_password() {
    let cluster = cluster();
    let locations = vec![LocationConfig::new("/billing/", "billing").with_credentials("bill", "nope")];

    let result = ConnectionRegistry::init(&locations, &factory(&cluster));
    assert!(matches!(
        result,
        Err(LifecycleError::Auth(AuthError::InvalidCredentials { .. }))
    ));
}

// =============================================================================
// Recovery
// =============================================================================

/// After a drop, credentials replay once each, in first-accepted order.
#[test]
fn test_replay_follows_append_order() {
    let cluster = cluster();
    let registry = ConnectionRegistry::init(&locations(), &factory(&cluster)).unwrap();
    let boot_attempts = cluster.auth_attempts().len();

    cluster.sever_connections();
    let shared = registry.lookup(SHARED).unwrap();
    let mut record = lock_record(&shared).unwrap();
    assert!(!record.is_connected());

    let reconnector = Reconnector::new(Duration::ZERO);
    assert!(reconnector.ensure_connected(&mut record).unwrap());
    assert!(record.is_connected());

    assert_eq!(
        cluster.auth_attempts()[boot_attempts..].to_vec(),
        vec![attempt("billing", "bill", true), attempt("catalog", "cat", true)]
    );
}

/// Recovering twice neither grows the credential store nor changes data.
#[test]
fn test_repeated_recovery_is_stable() {
    let cluster = cluster();
    let registry = ConnectionRegistry::init(&locations(), &factory(&cluster)).unwrap();
    let shared = registry.lookup(SHARED).unwrap();
    let reconnector = Reconnector::new(Duration::ZERO);
    let before = cluster.documents(&Namespace::new("billing", "fs"));

    for _ in 0..2 {
        cluster.sever_connections();
        let mut record = lock_record(&shared).unwrap();
        assert!(reconnector.ensure_connected(&mut record).unwrap());
        assert_eq!(record.credentials().len(), 2);
    }

    let mut record = lock_record(&shared).unwrap();
    assert!(!reconnector.ensure_connected(&mut record).unwrap());
    assert_eq!(cluster.documents(&Namespace::new("billing", "fs")), before);
}

/// A credential rejected on replay leaves the session disconnected.
#[test]
fn test_rejected_replay_disconnects() {
    let cluster = cluster();
    let registry = ConnectionRegistry::init(&locations(), &factory(&cluster)).unwrap();
    let shared = registry.lookup(SHARED).unwrap();
    let reconnector = Reconnector::new(Duration::ZERO);

    cluster.add_user("catalog", "cat", "rotated");
    cluster.sever_connections();

    let mut record = lock_record(&shared).unwrap();
    let err = reconnector.ensure_connected(&mut record).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Auth(AuthError::InvalidCredentials { ref db, .. }) if db == "catalog"
    ));
    assert!(!record.is_connected());

    // Stored credentials are never rewritten, so recovery keeps failing.
    let err = reconnector.ensure_connected(&mut record).unwrap_err();
    assert!(matches!(err, LifecycleError::Auth(_)));
}

#[test]
fn test_refused_reconnect_then_recovery() {
    let cluster = cluster();
    let registry = ConnectionRegistry::init(&locations(), &factory(&cluster)).unwrap();
    let shared = registry.lookup(SHARED).unwrap();
    let reconnector = Reconnector::new(Duration::ZERO);

    cluster.sever_connections();
    cluster.refuse_connections(true);
    {
        let mut record = lock_record(&shared).unwrap();
        assert!(matches!(
            reconnector.ensure_connected(&mut record),
            Err(LifecycleError::Connection(_))
        ));
    }

    cluster.refuse_connections(false);
    let mut record = lock_record(&shared).unwrap();
    assert!(reconnector.ensure_connected(&mut record).unwrap());
}

#[test]
fn test_shutdown_releases_connections() {
    let cluster = cluster();
    let registry = ConnectionRegistry::init(&locations(), &factory(&cluster)).unwrap();
    let shared = registry.lookup(SHARED).unwrap();

    registry.shutdown();
    assert!(registry.is_empty());
    assert!(!lock_record(&shared).unwrap().is_connected());
}
