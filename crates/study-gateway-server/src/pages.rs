//! Page documents and static assets.
//!
//! Requests not claimed by an API route are resolved here, in order:
//!
//! 1. Named page routes (`GET /login`, ...) always serve their document
//! 2. Files under the public asset root, served by `ServeDir`
//! 3. Anything else is `404 {"message": "Not Found"}`

use std::path::PathBuf;

use axum::Router;
use axum::body::Body;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{Response, StatusCode};
use axum::routing::get_service;
use tower_http::services::{ServeDir, ServeFile};

use crate::response::message_response;

/// A fixed page path served by one HTML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRoute {
    /// Request path.
    pub path: &'static str,
    /// Document file name, relative to the public root.
    pub document: &'static str,
}

/// Page routes of the StudyMetrics front end.
pub const PAGE_ROUTES: [PageRoute; 4] = [
    PageRoute {
        path: "/login",
        document: "login.html",
    },
    PageRoute {
        path: "/register",
        document: "register.html",
    },
    PageRoute {
        path: "/analytics",
        document: "analytics.html",
    },
    PageRoute {
        path: "/timer",
        document: "timer.html",
    },
];

/// Static site rooted at a public asset directory.
#[derive(Debug, Clone)]
pub struct StaticSite {
    root: PathBuf,
    pages: Vec<PageRoute>,
}

impl StaticSite {
    /// Site with the default page routes.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pages: PAGE_ROUTES.to_vec(),
        }
    }

    /// Filesystem path of a page's document.
    pub fn document_path(&self, page: &PageRoute) -> PathBuf {
        self.root.join(page.document)
    }

    /// Build the router for page routes with the static fallback.
    ///
    /// Non-GET requests to a page path fall through to the static lookup,
    /// which answers them with 404.
    pub fn router(&self) -> Router {
        let assets = ServeDir::new(&self.root)
            .call_fallback_on_method_not_allowed(true)
            .not_found_service(not_found.into_service());

        self.pages
            .iter()
            .fold(Router::new(), |router, page| {
                router.route(
                    page.path,
                    get_service(ServeFile::new(self.document_path(page)))
                        .fallback_service(assets.clone()),
                )
            })
            .fallback_service(assets)
    }
}

/// Response for requests nothing claims.
pub async fn not_found() -> Response<Body> {
    message_response(StatusCode::NOT_FOUND, "Not Found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Request, header};
    use tower::util::ServiceExt;

    fn site() -> (tempfile::TempDir, StaticSite) {
        let dir = tempfile::tempdir().unwrap();
        for page in PAGE_ROUTES {
            std::fs::write(
                dir.path().join(page.document),
                format!("<h1>{}</h1>", page.document),
            )
            .unwrap();
        }
        std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        std::fs::write(dir.path().join("app.css"), "body { margin: 0 }").unwrap();
        let site = StaticSite::new(dir.path());
        (dir, site)
    }

    async fn send(site: &StaticSite, method: Method, uri: &str) -> Response<Body> {
        site.router()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_page_routes_serve_documents() {
        let (_dir, site) = site();

        for page in PAGE_ROUTES {
            let response = send(&site, Method::GET, page.path).await;
            assert_eq!(response.status(), StatusCode::OK, "{}", page.path);
            assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
            assert_eq!(
                body_string(response).await,
                format!("<h1>{}</h1>", page.document)
            );
        }
    }

    #[tokio::test]
    async fn test_page_route_wins_over_like_named_file() {
        let (dir, site) = site();
        std::fs::write(dir.path().join("timer"), "raw timer file").unwrap();

        let response = send(&site, Method::GET, "/timer").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "<h1>timer.html</h1>");
    }

    #[tokio::test]
    async fn test_static_asset() {
        let (_dir, site) = site();

        let response = send(&site, Method::GET, "/app.css").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
        assert_eq!(body_string(response).await, "body { margin: 0 }");

        let response = send(&site, Method::GET, "/timer.html").await;
        assert_eq!(body_string(response).await, "<h1>timer.html</h1>");
    }

    #[tokio::test]
    async fn test_root_serves_index() {
        let (_dir, site) = site();

        let response = send(&site, Method::GET, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "<h1>home</h1>");
    }

    #[tokio::test]
    async fn test_unmatched_path_is_not_found() {
        let (_dir, site) = site();

        let response = send(&site, Method::GET, "/does/not/exist").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, r#"{"message":"Not Found"}"#);
    }

    #[tokio::test]
    async fn test_non_get_falls_through_to_not_found() {
        let (_dir, site) = site();

        let response = send(&site, Method::POST, "/login").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&site, Method::DELETE, "/app.css").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let site = StaticSite::new(dir.path());

        let response = send(&site, Method::GET, "/analytics").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
