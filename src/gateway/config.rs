//! Listen address for the gateway's HTTP surface.

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigResult};

/// Address the gateway binds when none is configured
pub const DEFAULT_HOST: &str = "0.0.0.0";

pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// `http` block of the gateway configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpServerConfig {
    /// IP address to bind; host names are not resolved
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_http_port")]
    pub port: u16,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_http_port(),
        }
    }
}

impl HttpServerConfig {
    /// Default host, given port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// `host:port`, bracketing IPv6 hosts
    pub fn socket_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Parsed bind address.
    pub fn listen_addr(&self) -> ConfigResult<SocketAddr> {
        let ip: IpAddr = self.host.parse().map_err(|_| {
            ConfigError::InvalidSetting(format!("http.host {:?} is not an IP address", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
