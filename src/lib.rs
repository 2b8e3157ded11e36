//! docrest - REST gateway for a document database
//!
//! Each configured location maps a URL prefix to one collection. The key
//! after the prefix selects a document by a single typed field; GET returns
//! it as JSON, DELETE removes it.

pub mod bson;
pub mod cli;
pub mod config;
pub mod connection;
pub mod driver;
pub mod gateway;
pub mod json;
pub mod query;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
