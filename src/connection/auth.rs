//! # Authenticator
//!
//! Authenticates a connection, records the credential for replay and probes
//! a database to detect authentication that was required but not given.

use crate::driver::Namespace;

use super::credentials::Credential;
use super::errors::{AuthError, AuthResult};
use super::record::ConnectionRecord;

/// Collection queried by the access probe
pub const PROBE_COLLECTION: &str = "test";

/// Stateless authentication operations on a [`ConnectionRecord`]
pub struct Authenticator;

impl Authenticator {
    /// Run the authentication command and, on success, store the credential.
    pub fn authenticate(
        record: &mut ConnectionRecord,
        db: &str,
        user: &str,
        pass: &str,
    ) -> AuthResult<()> {
        if !record.session.authenticate(db, user, pass) {
            tracing::error!(connection = %record.name, db, user, "invalid user/pass");
            return Err(AuthError::InvalidCredentials {
                db: db.to_string(),
                user: user.to_string(),
            });
        }

        let appended = record.credentials.push(Credential::new(db, user, pass));
        tracing::debug!(connection = %record.name, db, user, appended, "authenticated");
        Ok(())
    }

    /// Query `<db>.test` and fail if the database reports an error.
    pub fn verify(record: &mut ConnectionRecord, db: &str) -> AuthResult<()> {
        let ns = Namespace::new(db, PROBE_COLLECTION);
        record
            .session
            .find(&ns, None)
            .map_err(|source| AuthError::Probe {
                db: db.to_string(),
                source,
            })?;

        if let Some(message) = record.session.last_error(db) {
            tracing::error!(connection = %record.name, db, %message, "authentication required");
            return Err(AuthError::AuthenticationRequired {
                db: db.to_string(),
                message,
            });
        }
        Ok(())
    }

    /// Re-run every stored credential in insertion order.
    ///
    /// Stops at the first rejected credential. The store is never modified.
    pub fn replay(record: &mut ConnectionRecord) -> AuthResult<()> {
        let ConnectionRecord {
            name,
            session,
            credentials,
        } = record;

        for cred in credentials.iter() {
            if !session.authenticate(cred.db(), cred.user(), cred.pass()) {
                tracing::error!(
                    connection = %name,
                    db = cred.db(),
                    user = cred.user(),
                    "invalid user/pass during reauth"
                );
                return Err(AuthError::InvalidCredentials {
                    db: cred.db().to_string(),
                    user: cred.user().to_string(),
                });
            }
        }

        tracing::debug!(connection = %name, count = credentials.len(), "credentials replayed");
        Ok(())
    }
}
