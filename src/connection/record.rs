//! # Connection Record
//!
//! One logical database connection: its registry name, the driver session
//! and the credentials authenticated on it.

use std::fmt;

use crate::driver::Driver;

use super::credentials::CredentialStore;

/// A named connection owned by the registry
pub struct ConnectionRecord {
    pub(crate) name: String,
    pub(crate) session: Box<dyn Driver>,
    pub(crate) credentials: CredentialStore,
}

impl ConnectionRecord {
    pub fn new(name: impl Into<String>, session: Box<dyn Driver>) -> Self {
        Self {
            name: name.into(),
            session,
            credentials: CredentialStore::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn session(&self) -> &dyn Driver {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> &mut dyn Driver {
        self.session.as_mut()
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }
}

impl fmt::Debug for ConnectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRecord")
            .field("name", &self.name)
            .field("connected", &self.is_connected())
            .field("credentials", &self.credentials)
            .finish()
    }
}
