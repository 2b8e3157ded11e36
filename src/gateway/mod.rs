//! # Document Gateway
//!
//! HTTP front end mapping each configured location to a collection.
//!
//! # Endpoints (per location)
//!
//! - `GET <location><key>` - fetch the document whose key field equals `key`
//! - `DELETE <location><key>` - remove it
//! - `PUT <location><key>` - body is received and acknowledged, not stored
//!
//! Any other method gets 405. Paths matching no location get 404.

pub mod body;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod response;
pub mod routes;
pub mod server;
pub mod url;

pub use body::RequestBody;
pub use config::HttpServerConfig;
pub use dispatcher::{CrudDispatcher, CrudMethod, CrudRequest, Stage};
pub use errors::{GatewayError, GatewayResult};
pub use response::{GatewayResponse, JSON_CONTENT_TYPE};
pub use routes::{gateway_routes, GatewayState};
pub use server::HttpServer;
