//! # Credential Store
//!
//! Ordered, append-only list of the credentials a connection has
//! authenticated with. Replayed front to back after every reconnect.

use std::fmt;

/// Immutable (database, user, password) triple
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    db: String,
    user: String,
    pass: String,
}

impl Credential {
    pub fn new(db: impl Into<String>, user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            db: db.into(),
            user: user.into(),
            pass: pass.into(),
        }
    }

    pub fn db(&self) -> &str {
        &self.db
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn pass(&self) -> &str {
        &self.pass
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("db", &self.db)
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

/// Append-only credential list of one connection
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    entries: Vec<Credential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `credential` unless an identical one is already stored.
    ///
    /// Returns `true` if it was appended.
    pub fn push(&mut self, credential: Credential) -> bool {
        if self.entries.contains(&credential) {
            return false;
        }
        self.entries.push(credential);
        true
    }

    /// Credentials in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
