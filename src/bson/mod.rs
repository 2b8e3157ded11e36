//! # Document Model
//!
//! The value types exchanged with the database driver: object ids, typed
//! scalars and ordered documents.

pub mod document;
pub mod oid;

pub use document::{Document, Value};
pub use oid::{ObjectId, OidParseError, OID_HEX_LEN, OID_LEN};
