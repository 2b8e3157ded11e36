//! # Connection Management
//!
//! Named database connections, their stored credentials and the bounded
//! reconnect path taken when a request finds its connection down.
//!
//! ```text
//! ConnectionRegistry ──▶ Arc<Mutex<ConnectionRecord>>
//!                              │
//!                              ├── Box<dyn Driver>
//!                              └── CredentialStore ◀── Authenticator
//!                                         ▲
//!                                  Reconnector (replay)
//! ```

pub mod auth;
pub mod credentials;
pub mod errors;
pub mod reconnect;
pub mod record;
pub mod registry;

pub use auth::{Authenticator, PROBE_COLLECTION};
pub use credentials::{Credential, CredentialStore};
pub use errors::{
    AuthError, AuthResult, ConnectionError, ConnectionResult, LifecycleError, LifecycleResult,
};
pub use reconnect::Reconnector;
pub use record::ConnectionRecord;
pub use registry::{lock_record, ConnectionRegistry, DriverFactory, SharedRecord};
