//! # CRUD Dispatcher
//!
//! Per-request state machine:
//!
//! ```text
//! Init ─▶ ConnectionResolved ─▶ Reconnected ─▶ KeyDecoded ─▶ Dispatched(GET|PUT|DELETE) ─▶ Responded
//!   └──────────────┴──────────────────┴─────────────┴──────────────┴── error ──────────────▶ Responded
//! ```
//!
//! Database calls block. The dispatcher runs on a blocking thread and holds
//! the connection record's lock from resolution until it responds, so a
//! record never serves two requests at once.

use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use uuid::Uuid;

use crate::bson::Document;
use crate::config::LocationConfig;
use crate::connection::{lock_record, ConnectionRegistry, Reconnector};
use crate::driver::{Driver, Namespace};
use crate::json;
use crate::query::{Query, QueryBuilder};

use super::body::RequestBody;
use super::errors::{GatewayError, GatewayResult};
use super::response::GatewayResponse;
use super::url::{extract_key, percent_decode};

/// Methods the gateway serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrudMethod {
    Get,
    Put,
    Delete,
}

impl CrudMethod {
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(CrudMethod::Get),
            Method::PUT => Some(CrudMethod::Put),
            Method::DELETE => Some(CrudMethod::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for CrudMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrudMethod::Get => "GET",
            CrudMethod::Put => "PUT",
            CrudMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Request state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    ConnectionResolved,
    Reconnected,
    KeyDecoded,
    Dispatched(CrudMethod),
    Responded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Init => f.write_str("init"),
            Stage::ConnectionResolved => f.write_str("connection_resolved"),
            Stage::Reconnected => f.write_str("reconnected"),
            Stage::KeyDecoded => f.write_str("key_decoded"),
            Stage::Dispatched(method) => write!(f, "dispatched({})", method),
            Stage::Responded => f.write_str("responded"),
        }
    }
}

/// One request as seen by the dispatcher
#[derive(Debug)]
pub struct CrudRequest<'a> {
    pub method: &'a Method,
    /// Raw, still percent-encoded URI path
    pub path: &'a str,
    /// Received body, PUT only
    pub body: Option<&'a RequestBody>,
}

/// Executes requests against the registry's connections
pub struct CrudDispatcher {
    registry: Arc<ConnectionRegistry>,
    reconnector: Reconnector,
}

impl CrudDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>, reconnector: Reconnector) -> Self {
        Self {
            registry,
            reconnector,
        }
    }

    /// Run one request to completion. Never fails; errors become statuses.
    pub fn dispatch(&self, location: &LocationConfig, request: CrudRequest<'_>) -> GatewayResponse {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "request",
            %request_id,
            method = %request.method,
            location = %location.location
        );
        let _entered = span.enter();

        let mut stage = Stage::Init;
        let result = self.run(location, &request, &mut stage);
        let failed_at = stage;
        stage = Stage::Responded;

        match result {
            Ok(response) => {
                tracing::debug!(status = response.status.as_u16(), %stage, "request complete");
                response
            }
            Err(err) => {
                let status = err.status_code();
                if status.is_server_error() {
                    tracing::error!(
                        status = status.as_u16(),
                        stage = %failed_at,
                        error = %err,
                        "request failed"
                    );
                } else {
                    tracing::debug!(
                        status = status.as_u16(),
                        stage = %failed_at,
                        error = %err,
                        "request rejected"
                    );
                }
                GatewayResponse::status(status)
            }
        }
    }

    fn run(
        &self,
        location: &LocationConfig,
        request: &CrudRequest<'_>,
        stage: &mut Stage,
    ) -> GatewayResult<GatewayResponse> {
        let shared = self.registry.lookup(&location.connection)?;
        let mut record = lock_record(&shared)?;
        *stage = Stage::ConnectionResolved;

        self.reconnector.ensure_connected(&mut record)?;
        *stage = Stage::Reconnected;

        let raw_key = extract_key(&location.location, request.path)?;
        let key = percent_decode(raw_key.as_bytes())?;
        *stage = Stage::KeyDecoded;

        let method = CrudMethod::from_method(request.method)
            .ok_or_else(|| GatewayError::MethodNotAllowed(request.method.to_string()))?;
        *stage = Stage::Dispatched(method);

        let ns = location.namespace();
        match method {
            CrudMethod::Get => {
                let query = QueryBuilder::build(location.key_type, &location.key_field, &key)?;
                Self::get(record.session_mut(), &ns, &query)
            }
            CrudMethod::Delete => {
                let query = QueryBuilder::build(location.key_type, &location.key_field, &key)?;
                Self::delete(record.session_mut(), &ns, &query)
            }
            CrudMethod::Put => Self::put(request.body),
        }
    }

    /// Advance a cursor once over `query`
    fn probe(
        session: &mut dyn Driver,
        ns: &Namespace,
        query: &Query,
    ) -> GatewayResult<Option<Document>> {
        let mut cursor = session.find(ns, Some(query)).map_err(GatewayError::Driver)?;
        cursor.advance().map_err(GatewayError::Driver)
    }

    fn get(
        session: &mut dyn Driver,
        ns: &Namespace,
        query: &Query,
    ) -> GatewayResult<GatewayResponse> {
        let doc = Self::probe(session, ns, query)?.ok_or(GatewayError::NotFound)?;
        let body = json::to_json(&doc)?;
        tracing::debug!(%ns, bytes = body.len(), "document encoded");
        Ok(GatewayResponse::json(body))
    }

    fn delete(
        session: &mut dyn Driver,
        ns: &Namespace,
        query: &Query,
    ) -> GatewayResult<GatewayResponse> {
        if Self::probe(session, ns, query)?.is_none() {
            return Err(GatewayError::NotFound);
        }
        session.remove(ns, query).map_err(GatewayError::RemoveFailed)?;
        tracing::debug!(%ns, "document removed");
        Ok(GatewayResponse::no_content())
    }

    /// Receives the body and acknowledges it. Nothing is written back to
    /// the database.
    fn put(body: Option<&RequestBody>) -> GatewayResult<GatewayResponse> {
        let received = match body {
            Some(body) => body.read()?,
            None => Vec::new(),
        };
        tracing::debug!(bytes = received.len(), "PUT body received, not persisted");
        Ok(GatewayResponse::no_content())
    }
}
