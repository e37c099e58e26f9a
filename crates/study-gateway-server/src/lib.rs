//! Request dispatch and lifecycle gateway for the StudyMetrics study tracker.
//!
//! This crate provides the HTTP entry point of the application. It handles:
//!
//! - Routing API paths to their collaborators, for any verb
//! - Turning collaborator failures into a single well-formed response
//! - Serving page documents and static assets
//! - Draining in-flight requests on SIGINT/SIGTERM
//!
//! # Quick Start
//!
//! ```ignore
//! use study_gateway_common::GatewayConfig;
//! use study_gateway_server::{ApiRoute, GatewayServer, RouteTable, handler_fn};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let routes = RouteTable::from_fn(|route| {
//!         handler_fn(move |_req, res| async move {
//!             res.json(http::StatusCode::OK, &serde_json::json!({ "route": route.path() }))?;
//!             anyhow::Ok(())
//!         })
//!     });
//!
//!     let server = GatewayServer::new(GatewayConfig::default().apply_env()?, routes);
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod collaborators;
pub mod handler;
pub mod lifecycle;
pub mod pages;
pub mod request;
pub mod response;
pub mod router;
pub mod routes;
pub mod server;

pub use handler::{ApiHandler, SharedHandler, handler_fn, sync_handler_fn};
pub use lifecycle::{Lifecycle, ServerState, ShutdownSource};
pub use pages::{PAGE_ROUTES, PageRoute, StaticSite};
pub use request::ApiRequest;
pub use response::ResponseWriter;
pub use routes::{ApiRoute, RouteTable};
pub use server::{GatewayServer, TestHandle};
