//! HTTP router configuration.
//!
//! Resolution order for an inbound request:
//!
//! - API routes (exact path, any verb) through [`dispatch`]
//! - Named page routes (GET)
//! - Static assets under the public root
//! - `404 Not Found`

use axum::Router;
use axum::extract::Request;
use axum::routing::any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use study_gateway_common::GatewayConfig;

use crate::handler::dispatch;
use crate::pages::StaticSite;
use crate::routes::RouteTable;

/// Build the application router.
///
/// # Arguments
///
/// * `routes` - API route table
/// * `config` - Asset root, body limit and CORS settings
pub fn build_router(routes: &RouteTable, config: &GatewayConfig) -> Router {
    let site = StaticSite::new(&config.public_dir);
    let body_limit = config.max_body_bytes;

    let router = routes
        .entries()
        .iter()
        .fold(site.router(), |router, entry| {
            let path = entry.path();
            let handler = entry.handler().clone();
            router.route(
                path,
                any(move |request: Request| dispatch(path, handler.clone(), request, body_limit)),
            )
        })
        .layer(TraceLayer::new_for_http());

    if config.cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
