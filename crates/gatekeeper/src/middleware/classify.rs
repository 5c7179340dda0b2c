//! Route classification.
//!
//! Pure string matching over the raw path; runs first on every request so
//! static assets leave the gate before any other work is done.

use crate::middleware::language::strip_locale;
use crate::route_table::RouteTable;

/// Category of an incoming path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Build artifacts, well-known files and plain asset extensions.
    StaticAsset,
    /// Authentication endpoints, owned entirely by the auth service.
    AuthApi,
    ApiRoute,
    /// Login, register and email verification pages.
    AuthPage,
    PublicPage,
    PrivateRoute,
    /// Page routes found in neither table, and malformed paths.
    Other,
}

impl RouteClass {
    pub fn is_api(self) -> bool {
        matches!(self, RouteClass::AuthApi | RouteClass::ApiRoute)
    }
}

const STATIC_PREFIXES: &[&str] = &[
    "/_next",
    "/favicon.ico",
    "/robots.txt",
    "/sitemap.xml",
];

/// Operational endpoints served by the gate process itself.
const SERVICE_PATHS: &[&str] = &["/health", "/metrics"];

const STATIC_SEGMENTS: &[&str] = &["/images/", "/assets/", "/.well-known/"];

const STATIC_EXTENSIONS: &[&str] = &[".ico", ".txt", ".xml", ".css", ".js", ".ts"];

const AUTH_PAGES: &[&str] = &["login", "register", "verify-email"];

/// Classify a raw request path.
///
/// An empty path or one that does not start with `/` is `Other`, the class
/// that requires a session and is never treated as public.
pub fn classify(path: &str, table: &RouteTable) -> RouteClass {
    if path.is_empty() || !path.starts_with('/') {
        tracing::debug!(path = %path, "malformed path, classifying as other");
        return RouteClass::Other;
    }

    if is_static_asset(path) {
        return RouteClass::StaticAsset;
    }

    if path.starts_with("/api/auth") {
        return RouteClass::AuthApi;
    }
    if path.starts_with("/api") {
        return RouteClass::ApiRoute;
    }

    let page = strip_locale(path);
    if is_unprefixed_auth_page(page) {
        RouteClass::AuthPage
    } else if table.is_public_page(page) {
        RouteClass::PublicPage
    } else if table.is_private(page) {
        RouteClass::PrivateRoute
    } else {
        RouteClass::Other
    }
}

/// Whether the path is served straight through without any gate logic.
pub fn is_static_asset(path: &str) -> bool {
    SERVICE_PATHS.contains(&path)
        || STATIC_PREFIXES.iter().any(|p| path.starts_with(p))
        || STATIC_SEGMENTS.iter().any(|s| path.contains(s))
        || STATIC_EXTENSIONS.iter().any(|e| path.ends_with(e))
}

/// Whether a path (with or without locale prefix) is an auth page.
///
/// Matches `/login`, `/register` and `/verify-email`, alone or followed by
/// `/`, so `/verify-email-pending` is not an auth page.
pub fn is_auth_page(path: &str) -> bool {
    is_unprefixed_auth_page(strip_locale(path))
}

fn is_unprefixed_auth_page(path: &str) -> bool {
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    let first = rest.split(['/', '?']).next().unwrap_or_default();
    AUTH_PAGES.contains(&first)
}
