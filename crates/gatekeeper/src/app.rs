//! Router assembly.

use axum::Router;
use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::Response;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::Config;
use crate::middleware::finalize::{ROBOTS_NOINDEX, X_ROBOTS_TAG};
use crate::middleware::gate_request;
use crate::routes;
use crate::state::AppState;

/// Headers added to every response that does not already carry them.
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-dns-prefetch-control", "on"),
    (
        "strict-transport-security",
        "max-age=63072000; includeSubDomains; preload",
    ),
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "SAMEORIGIN"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    (
        "permissions-policy",
        "camera=(), microphone=(), geolocation=(self)",
    ),
];

/// Full router: service routes, the gate, and upstream forwarding for
/// everything else.
pub fn build_router(state: AppState) -> Router {
    let forwarding = Router::new().fallback(routes::upstream::forward);
    build_router_with(forwarding, state)
}

/// Full router around a caller-supplied inner router.
///
/// `inner` stands in for the page renderer and API handlers.
pub fn build_router_with(inner: Router<AppState>, state: AppState) -> Router {
    let cors = build_cors_layer(state.config());

    let mut router = Router::new()
        .merge(routes::health::router())
        .merge(routes::metrics::router())
        .merge(routes::seo::router())
        .merge(inner)
        // Middleware layers (last added = first executed in request flow):
        // TraceLayer → CORS → security headers → api robots tag → gate → routes
        .layer(middleware::from_fn_with_state(state.clone(), gate_request))
        .layer(middleware::from_fn(tag_api_responses));

    for &(name, value) in SECURITY_HEADERS {
        router = router.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Keep every API response out of search indexes.
async fn tag_api_responses(request: Request, next: Next) -> Response {
    let is_api = request.uri().path().starts_with("/api");
    let mut response = next.run(request).await;
    if is_api {
        response
            .headers_mut()
            .entry(X_ROBOTS_TAG)
            .or_insert(HeaderValue::from_static(ROBOTS_NOINDEX));
    }
    response
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if config.cors_allowed_origins.len() == 1 && config.cors_allowed_origins[0] == "*" {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();

        // Credentials cannot be combined with a wildcard header list.
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    }
}
