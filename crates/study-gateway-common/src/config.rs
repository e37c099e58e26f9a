//! Configuration structures for the study-gateway.
//!
//! [`GatewayConfig`] holds everything the gateway needs at startup:
//! the listening address, the public asset root, and the request body limit.
//! It can be deserialized from a config file and then refined by the
//! process environment.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::GatewayError;

/// Environment variable that overrides the listening port.
pub const PORT_ENV: &str = "PORT";

/// Gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Interface to bind.
    #[serde(default = "defaults::host")]
    pub host: IpAddr,

    /// Port to bind.
    ///
    /// Overridden by the `PORT` environment variable when it is set.
    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Root directory for static assets and page documents.
    #[serde(default = "defaults::public_dir")]
    pub public_dir: PathBuf,

    /// Maximum accepted request body size for API routes, in bytes.
    #[serde(default = "defaults::max_body_bytes")]
    pub max_body_bytes: usize,

    /// Route SIGTERM/SIGINT into the drain sequence.
    ///
    /// When disabled the OS default for those signals applies.
    #[serde(default = "defaults::graceful_shutdown")]
    pub graceful_shutdown: bool,

    /// Answer CORS preflights and add permissive CORS headers.
    ///
    /// When enabled, `OPTIONS` requests are answered by the CORS layer and
    /// never reach API handlers.
    #[serde(default = "defaults::cors")]
    pub cors: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
            public_dir: defaults::public_dir(),
            max_body_bytes: defaults::max_body_bytes(),
            graceful_shutdown: defaults::graceful_shutdown(),
            cors: defaults::cors(),
        }
    }
}

impl GatewayConfig {
    /// The socket address to bind.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the public asset root.
    pub fn with_public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = dir.into();
        self
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, GatewayError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` to read variables.
    ///
    /// An unset or empty `PORT` keeps the configured port.
    pub fn apply_env_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, GatewayError> {
        if let Some(raw) = lookup(PORT_ENV).filter(|v| !v.trim().is_empty()) {
            let port = raw.trim().parse::<u16>().map_err(|_| {
                GatewayError::invalid_config(format!(
                    "{PORT_ENV} must be a port number, got '{raw}'"
                ))
            })?;
            debug!(port, "Port overridden from environment");
            self.port = port;
        }
        Ok(self)
    }
}

/// Default value functions for serde.
mod defaults {
    use std::net::{IpAddr, Ipv4Addr};
    use std::path::PathBuf;

    pub const fn host() -> IpAddr {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    }

    pub const fn port() -> u16 {
        3000
    }

    pub fn public_dir() -> PathBuf {
        PathBuf::from("public")
    }

    pub const fn max_body_bytes() -> usize {
        100 * 1024
    }

    pub const fn graceful_shutdown() -> bool {
        true
    }

    pub const fn cors() -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();

        assert_eq!(config.port, 3000);
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.public_dir, PathBuf::from("public"));
        assert_eq!(config.max_body_bytes, 102_400);
        assert!(config.graceful_shutdown);
        assert!(config.cors);
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_port_env_override() {
        let config = GatewayConfig::default()
            .apply_env_from(env(&[("PORT", "8081")]))
            .unwrap();
        assert_eq!(config.port, 8081);
    }

    #[test]
    fn test_missing_or_empty_port_keeps_default() {
        let config = GatewayConfig::default().apply_env_from(env(&[])).unwrap();
        assert_eq!(config.port, 3000);

        let config = GatewayConfig::default()
            .apply_env_from(env(&[("PORT", "")]))
            .unwrap();
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = GatewayConfig::default().apply_env_from(env(&[("PORT", "http")]));
        assert!(matches!(result, Err(GatewayError::InvalidConfig { .. })));

        let result = GatewayConfig::default().apply_env_from(env(&[("PORT", "70000")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_deserialization() {
        let json = r#"{"port": 4000, "public_dir": "/srv/www"}"#;
        let config: GatewayConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.public_dir, PathBuf::from("/srv/www"));
        // Defaults for unspecified fields
        assert_eq!(config.max_body_bytes, 102_400);
        assert!(config.graceful_shutdown);
    }

    #[test]
    fn test_builders() {
        let config = GatewayConfig::default()
            .with_port(0)
            .with_public_dir("assets");
        assert_eq!(config.port, 0);
        assert_eq!(config.public_dir, PathBuf::from("assets"));
    }
}
