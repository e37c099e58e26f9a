//! API route table.
//!
//! The table is built once during startup and never mutated afterwards. It is
//! shared read-only by every request through the router.

use std::fmt;

use study_gateway_common::GatewayError;

use crate::handler::SharedHandler;
use crate::pages::PAGE_ROUTES;

/// Characters the router would read as capture or wildcard syntax.
const PATTERN_CHARS: [char; 4] = [':', '*', '{', '}'];

/// The API routes exposed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiRoute {
    AuthLogin,
    AuthRegister,
    AuthVerify,
    UserData,
    TimerSessions,
    AnalyticsDashboard,
    AnalyticsStatistics,
    AnalyticsTargetCgpa,
    AdminBackup,
}

impl ApiRoute {
    /// Every API route, in registration order.
    pub const ALL: [Self; 9] = [
        Self::AuthLogin,
        Self::AuthRegister,
        Self::AuthVerify,
        Self::UserData,
        Self::TimerSessions,
        Self::AnalyticsDashboard,
        Self::AnalyticsStatistics,
        Self::AnalyticsTargetCgpa,
        Self::AdminBackup,
    ];

    /// Request path served by this route.
    pub const fn path(self) -> &'static str {
        match self {
            Self::AuthLogin => "/api/auth/login",
            Self::AuthRegister => "/api/auth/register",
            Self::AuthVerify => "/api/auth/verify",
            Self::UserData => "/api/user/data",
            Self::TimerSessions => "/api/timer/sessions",
            Self::AnalyticsDashboard => "/api/analytics/dashboard",
            Self::AnalyticsStatistics => "/api/analytics/statistics",
            Self::AnalyticsTargetCgpa => "/api/analytics/target-cgpa",
            Self::AdminBackup => "/api/admin/backup",
        }
    }

    /// Name of the collaborator the route delegates to.
    pub const fn collaborator(self) -> &'static str {
        match self {
            Self::AuthLogin => "auth-login",
            Self::AuthRegister => "auth-register",
            Self::AuthVerify => "auth-verify",
            Self::UserData => "user-data",
            Self::TimerSessions => "timer-sessions",
            Self::AnalyticsDashboard => "analytics-dashboard",
            Self::AnalyticsStatistics => "analytics-statistics",
            Self::AnalyticsTargetCgpa => "analytics-target-cgpa",
            Self::AdminBackup => "admin-backup",
        }
    }
}

impl fmt::Display for ApiRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// One API path bound to its handler. Accepts any verb.
#[derive(Clone)]
pub struct RouteEntry {
    path: &'static str,
    handler: SharedHandler,
}

impl RouteEntry {
    /// Request path.
    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Bound handler.
    pub fn handler(&self) -> &SharedHandler {
        &self.handler
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Immutable mapping from API path to handler.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Start building a table.
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Bind every [`ApiRoute`] to the handler returned by `f`.
    pub fn from_fn(mut f: impl FnMut(ApiRoute) -> SharedHandler) -> Self {
        Self {
            entries: ApiRoute::ALL
                .iter()
                .map(|route| RouteEntry {
                    path: route.path(),
                    handler: f(*route),
                })
                .collect(),
        }
    }

    /// Find the entry for an exact path.
    pub fn lookup(&self, path: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Entries in registration order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for a [`RouteTable`].
///
/// Rejects relative paths, paths with capture or wildcard syntax, and paths
/// already taken by another API route or by a page route.
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    entries: Vec<RouteEntry>,
}

impl RouteTableBuilder {
    /// Register `handler` for `path`.
    pub fn register(
        mut self,
        path: &'static str,
        handler: SharedHandler,
    ) -> Result<Self, GatewayError> {
        if !path.starts_with('/') || path.contains(PATTERN_CHARS) {
            return Err(GatewayError::invalid_route(path));
        }
        if self.entries.iter().any(|e| e.path == path)
            || PAGE_ROUTES.iter().any(|page| page.path == path)
        {
            return Err(GatewayError::duplicate_route(path));
        }
        self.entries.push(RouteEntry { path, handler });
        Ok(self)
    }

    /// Register `handler` for a known API route.
    pub fn route(self, route: ApiRoute, handler: SharedHandler) -> Result<Self, GatewayError> {
        self.register(route.path(), handler)
    }

    pub fn build(self) -> RouteTable {
        RouteTable {
            entries: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::handler::sync_handler_fn;

    fn noop() -> SharedHandler {
        sync_handler_fn(|_req, _res| Ok(()))
    }

    #[test]
    fn test_paths_are_unique() {
        let paths: HashSet<_> = ApiRoute::ALL.iter().map(|r| r.path()).collect();
        assert_eq!(paths.len(), ApiRoute::ALL.len());
        assert!(ApiRoute::ALL.iter().all(|r| r.path().starts_with("/api/")));
    }

    #[test]
    fn test_from_fn_covers_all_routes() {
        let mut seen = Vec::new();
        let table = RouteTable::from_fn(|route| {
            seen.push(route);
            noop()
        });

        assert_eq!(table.len(), 9);
        assert_eq!(seen, ApiRoute::ALL.to_vec());
        assert_eq!(
            table.lookup("/api/analytics/target-cgpa").map(RouteEntry::path),
            Some("/api/analytics/target-cgpa")
        );
    }

    #[test]
    fn test_lookup_is_exact() {
        let table = RouteTable::from_fn(|_| noop());

        assert!(table.lookup("/api/user/data").is_some());
        assert!(table.lookup("/api/user/data/").is_none());
        assert!(table.lookup("/api/user").is_none());
        assert!(table.lookup("/API/USER/DATA").is_none());
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let result = RouteTable::builder()
            .route(ApiRoute::AuthLogin, noop())
            .unwrap()
            .register("/api/auth/login", noop());

        assert!(matches!(result, Err(GatewayError::DuplicateRoute { .. })));
    }

    #[test]
    fn test_builder_rejects_relative_path() {
        let result = RouteTable::builder().register("api/auth/login", noop());
        assert!(matches!(result, Err(GatewayError::InvalidRoute { .. })));
    }

    #[test]
    fn test_builder_rejects_pattern_syntax() {
        for path in ["/api/:id", "/api/*rest", "/api/{id}", "/api/user}"] {
            let result = RouteTable::builder().register(path, noop());
            assert!(
                matches!(result, Err(GatewayError::InvalidRoute { .. })),
                "{path}"
            );
        }
    }

    #[test]
    fn test_builder_rejects_page_paths() {
        for page in PAGE_ROUTES {
            let result = RouteTable::builder().register(page.path, noop());
            assert!(
                matches!(result, Err(GatewayError::DuplicateRoute { .. })),
                "{}",
                page.path
            );
        }
    }

    #[test]
    fn test_builder_keeps_order() {
        let table = RouteTable::builder()
            .route(ApiRoute::AdminBackup, noop())
            .unwrap()
            .route(ApiRoute::AuthVerify, noop())
            .unwrap()
            .build();

        let paths: Vec<_> = table.entries().iter().map(RouteEntry::path).collect();
        assert_eq!(paths, vec!["/api/admin/backup", "/api/auth/verify"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(ApiRoute::TimerSessions.to_string(), "/api/timer/sessions");
        assert_eq!(ApiRoute::TimerSessions.collaborator(), "timer-sessions");
    }
}
