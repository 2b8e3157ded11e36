//! Gateway HTTP Routes
//!
//! Every configured location is served from a single fallback handler that
//! picks the longest matching prefix and hands the request to the
//! dispatcher on a blocking thread.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::LocationConfig;

use super::body::RequestBody;
use super::dispatcher::{CrudDispatcher, CrudRequest};

// ==================
// Shared State
// ==================

/// State shared across requests
pub struct GatewayState {
    dispatcher: Arc<CrudDispatcher>,
    /// Longest prefix first
    locations: Vec<Arc<LocationConfig>>,
    body_buffer_size: usize,
}

impl GatewayState {
    pub fn new(
        dispatcher: Arc<CrudDispatcher>,
        locations: &[LocationConfig],
        body_buffer_size: usize,
    ) -> Self {
        let mut locations: Vec<Arc<LocationConfig>> =
            locations.iter().cloned().map(Arc::new).collect();
        locations.sort_by(|a, b| b.location.len().cmp(&a.location.len()));

        Self {
            dispatcher,
            locations,
            body_buffer_size,
        }
    }

    /// Location with the longest prefix of `path`
    pub fn match_location(&self, path: &str) -> Option<&Arc<LocationConfig>> {
        self.locations
            .iter()
            .find(|loc| path.starts_with(loc.location.as_str()))
    }
}

// ==================
// Router
// ==================

/// Build the gateway router
pub fn gateway_routes(state: Arc<GatewayState>) -> Router {
    Router::new()
        .fallback(handle_request)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

async fn handle_request(State(state): State<Arc<GatewayState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    let Some(location) = state.match_location(&path).cloned() else {
        tracing::debug!(%path, "no location matches");
        return StatusCode::NOT_FOUND.into_response();
    };

    let body = if parts.method == Method::PUT {
        match RequestBody::collect(body, state.body_buffer_size).await {
            Ok(body) => Some(body),
            Err(err) => {
                tracing::error!(error = %err, "failed to receive request body");
                return err.into_response();
            }
        }
    } else {
        None
    };

    let dispatcher = Arc::clone(&state.dispatcher);
    let method = parts.method;
    let outcome = tokio::task::spawn_blocking(move || {
        dispatcher.dispatch(
            &location,
            CrudRequest {
                method: &method,
                path: &path,
                body: body.as_ref(),
            },
        )
    })
    .await;

    match outcome {
        Ok(response) => response.into_response(),
        Err(err) => {
            tracing::error!(error = %err, "dispatcher task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::connection::{ConnectionRegistry, Reconnector};

    fn state(prefixes: &[&str]) -> GatewayState {
        let locations: Vec<LocationConfig> = prefixes
            .iter()
            .map(|p| LocationConfig::new(*p, "app"))
            .collect();
        let dispatcher = CrudDispatcher::new(
            Arc::new(ConnectionRegistry::new()),
            Reconnector::new(Duration::ZERO),
        );
        GatewayState::new(Arc::new(dispatcher), &locations, 8192)
    }

    #[test]
    fn test_longest_prefix_wins() {
        let state = state(&["/", "/docs/", "/docs/archive/"]);
        let hit = |p: &str| state.match_location(p).map(|l| l.location.clone());

        assert_eq!(hit("/docs/archive/x").as_deref(), Some("/docs/archive/"));
        assert_eq!(hit("/docs/x").as_deref(), Some("/docs/"));
        assert_eq!(hit("/other").as_deref(), Some("/"));
    }

    #[test]
    fn test_no_match() {
        let state = state(&["/docs/"]);
        assert!(state.match_location("/files/x").is_none());
        assert!(state.match_location("/docs").is_none());
    }
}
