//! HTTP server implementation.
//!
//! This module provides the main [`GatewayServer`] struct, which owns the
//! listening socket for the lifetime of the process.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use study_gateway_common::{GatewayConfig, GatewayError};

use crate::lifecycle::{Lifecycle, ShutdownSource, spawn_signal_listener};
use crate::pages::PAGE_ROUTES;
use crate::router::build_router;
use crate::routes::RouteTable;

/// StudyMetrics gateway server.
///
/// # Example
///
/// ```ignore
/// use study_gateway_common::GatewayConfig;
/// use study_gateway_server::{GatewayServer, collaborators::unconfigured_routes};
///
/// let config = GatewayConfig::default().apply_env()?;
/// let server = GatewayServer::new(config, unconfigured_routes());
///
/// // Runs until SIGINT/SIGTERM, then drains in-flight requests
/// server.run().await?;
/// ```
pub struct GatewayServer {
    routes: RouteTable,
    config: GatewayConfig,
    lifecycle: Lifecycle,
}

impl GatewayServer {
    /// Create a new server instance.
    ///
    /// # Arguments
    ///
    /// * `config` - Listener, asset root and body limit settings
    /// * `routes` - API route table, immutable from here on
    pub fn new(config: GatewayConfig, routes: RouteTable) -> Self {
        Self {
            routes,
            config,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Get the server configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Get the lifecycle handle.
    ///
    /// Clones of this handle can request shutdown from anywhere.
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Build the application router.
    pub fn router(&self) -> Router {
        build_router(&self.routes, &self.config)
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, GatewayError> {
        let addr = self.config.bind_addr();
        TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::bind(addr, e))
    }

    /// Run the server until shutdown.
    ///
    /// With `graceful_shutdown` enabled, SIGINT and SIGTERM start the drain
    /// sequence; otherwise the OS default for those signals applies.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot bind to the address, if signal
    /// handlers cannot be installed, or if the serving loop fails.
    pub async fn run(self) -> Result<(), GatewayError> {
        let listener = self.bind().await?;

        let signals = if self.config.graceful_shutdown {
            Some(spawn_signal_listener(self.lifecycle.clone())?)
        } else {
            None
        };

        let result = self.serve(listener).await;

        if let Some(signals) = signals {
            signals.abort();
        }
        result
    }

    /// Serve on an already bound listener until the lifecycle drains.
    pub async fn serve(self, listener: TcpListener) -> Result<(), GatewayError> {
        let addr = listener.local_addr()?;
        let app = self.router();

        if !self.lifecycle.mark_listening() {
            info!("Shutdown requested before listening");
            self.lifecycle.mark_closed();
            return Ok(());
        }
        self.log_startup(addr);

        let lifecycle = self.lifecycle.clone();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { lifecycle.draining().await })
            .await;

        self.lifecycle.mark_closed();
        result.map_err(GatewayError::Serve)?;

        info!("Server closed");
        Ok(())
    }

    fn log_startup(&self, addr: SocketAddr) {
        let host = if addr.ip().is_unspecified() {
            "localhost".to_string()
        } else {
            addr.ip().to_string()
        };
        let base = format!("http://{host}:{}", addr.port());

        info!(
            addr = %addr,
            public_dir = %self.config.public_dir.display(),
            api_routes = self.routes.len(),
            "StudyMetrics server running on {base}"
        );
        for page in PAGE_ROUTES {
            info!("  GET  {base}{:<12} - {}", page.path, page.document);
        }
    }

    /// Start the server and return a handle for testing.
    ///
    /// The server binds to an ephemeral port (127.0.0.1:0) and does not
    /// install signal handlers.
    pub async fn start_test(
        config: GatewayConfig,
        routes: RouteTable,
    ) -> Result<TestHandle, GatewayError> {
        let mut config = config.with_port(0);
        config.host = IpAddr::V4(Ipv4Addr::LOCALHOST);

        let server = Self::new(config, routes);
        let listener = server.bind().await?;
        let addr = listener.local_addr()?;
        let lifecycle = server.lifecycle.clone();

        let handle = tokio::spawn(server.serve(listener));

        Ok(TestHandle {
            addr,
            lifecycle,
            handle,
        })
    }
}

/// Handle for a test server instance.
pub struct TestHandle {
    /// The address the server is bound to.
    addr: SocketAddr,
    /// Lifecycle of the running server.
    lifecycle: Lifecycle,
    /// Server task handle.
    handle: JoinHandle<Result<(), GatewayError>>,
}

impl TestHandle {
    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the server URL.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the lifecycle handle.
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Request shutdown without waiting for the drain to finish.
    pub fn trigger_shutdown(&self) -> bool {
        self.lifecycle.request_shutdown(ShutdownSource::Manual)
    }

    /// Wait for the server task to finish.
    pub async fn wait(self) -> Result<(), GatewayError> {
        self.handle
            .await
            .map_err(|e| GatewayError::Serve(std::io::Error::other(e)))?
    }

    /// Shutdown the server gracefully.
    pub async fn shutdown(self) -> Result<(), GatewayError> {
        self.trigger_shutdown();
        self.wait().await
    }
}
