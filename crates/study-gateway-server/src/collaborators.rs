//! Stand-in collaborators.
//!
//! The business logic behind each API route lives outside the gateway. Until
//! an embedder supplies it, [`NotConfigured`] answers every route with
//! `501 Not Implemented`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use tracing::debug;

use crate::handler::{ApiHandler, SharedHandler};
use crate::request::ApiRequest;
use crate::response::ResponseWriter;
use crate::routes::{ApiRoute, RouteTable};

/// Handler for a route whose collaborator is not wired in.
#[derive(Debug, Clone, Copy)]
pub struct NotConfigured {
    route: ApiRoute,
}

impl NotConfigured {
    pub fn new(route: ApiRoute) -> Self {
        Self { route }
    }

    pub fn shared(route: ApiRoute) -> SharedHandler {
        Arc::new(Self::new(route))
    }
}

#[async_trait]
impl ApiHandler for NotConfigured {
    async fn handle(&self, req: ApiRequest, res: ResponseWriter) -> anyhow::Result<()> {
        debug!(
            collaborator = self.route.collaborator(),
            method = %req.method(),
            "No collaborator configured"
        );
        res.json(
            StatusCode::NOT_IMPLEMENTED,
            &serde_json::json!({
                "message": "Not Implemented",
                "collaborator": self.route.collaborator(),
            }),
        )?;
        Ok(())
    }
}

/// Route table with every API route bound to [`NotConfigured`].
pub fn unconfigured_routes() -> RouteTable {
    RouteTable::from_fn(NotConfigured::shared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Uri};

    use crate::handler::invoke;

    #[tokio::test]
    async fn test_not_configured_response() {
        let handler = NotConfigured::shared(ApiRoute::AdminBackup);
        let req = ApiRequest::new(Method::GET, Uri::from_static("/api/admin/backup"));

        let response = invoke(handler, req).await;
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Not Implemented");
        assert_eq!(body["collaborator"], "admin-backup");
    }

    #[test]
    fn test_unconfigured_routes_cover_catalogue() {
        let table = unconfigured_routes();
        assert_eq!(table.len(), ApiRoute::ALL.len());
    }
}
