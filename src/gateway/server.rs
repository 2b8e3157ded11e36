//! # HTTP Server
//!
//! Binds the gateway router to its listen address.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::connection::{ConnectionRegistry, Reconnector};

use super::config::HttpServerConfig;
use super::dispatcher::CrudDispatcher;
use super::routes::{gateway_routes, GatewayState};

/// HTTP server for the document gateway
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server for `config` over an initialized registry
    pub fn new(config: &GatewayConfig, registry: Arc<ConnectionRegistry>) -> Self {
        let router = Self::build_router(config, registry);
        Self {
            config: config.http.clone(),
            router,
        }
    }

    fn build_router(config: &GatewayConfig, registry: Arc<ConnectionRegistry>) -> Router {
        let dispatcher = CrudDispatcher::new(registry, Reconnector::new(config.reconnect_backoff));
        let state = GatewayState::new(
            Arc::new(dispatcher),
            &config.locations,
            config.client_body_buffer_size,
        );
        gateway_routes(Arc::new(state))
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until the process is stopped
    pub async fn start(self) -> Result<(), std::io::Error> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    pub async fn start_with_shutdown<F>(self, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = self
            .config
            .listen_addr()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "docrest gateway listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("docrest gateway stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocationConfig;

    fn config() -> GatewayConfig {
        GatewayConfig {
            http: HttpServerConfig::with_port(9090),
            locations: vec![LocationConfig::new("/docs/", "app")],
            ..Default::default()
        }
    }

    #[test]
    fn test_server_creation() {
        let server = HttpServer::new(&config(), Arc::new(ConnectionRegistry::new()));
        assert_eq!(server.socket_addr(), "0.0.0.0:9090");
    }

    #[tokio::test]
    async fn test_invalid_listen_address() {
        let mut config = config();
        config.http.host = "not an address".to_string();
        let server = HttpServer::new(&config, Arc::new(ConnectionRegistry::new()));

        let err = server.start().await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
