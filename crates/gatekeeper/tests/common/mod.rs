#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Tests drive the REAL router built by `build_router_with`; only the page
//! renderer behind the gate is replaced, by an echo handler that reports the
//! request headers the gate forwarded. [`spawn_upstream`] serves the same
//! handler over TCP for tests of the forwarding router.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, Uri};
use axum::response::Response;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use carhire_gatekeeper::middleware::{LocaleRouter, PrefixLocaleRouter};
use carhire_gatekeeper::services::{JwtTokenVerifier, TokenVerifier};
use carhire_gatekeeper::{AppState, Config, build_router, build_router_with};
use carhire_test_utils::TEST_SECRET;

/// Headers the echo handler reports back.
const ECHOED_HEADERS: &[&str] = &["x-user-id", "x-user-role", "x-user-email", "x-locale"];

/// Configuration with the test secret and every other value defaulted.
pub fn test_config() -> Config {
    test_config_with(&[])
}

/// Test configuration with extra variables.
pub fn test_config_with(vars: &[(&str, &str)]) -> Config {
    let vars: Vec<(String, String)> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(move |key| {
        if key == "NEXTAUTH_SECRET" {
            return Some(TEST_SECRET.to_string());
        }
        vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    })
    .expect("test configuration is valid")
}

async fn echo(uri: Uri, headers: HeaderMap) -> Json<Value> {
    let mut seen = serde_json::Map::new();
    for name in ECHOED_HEADERS {
        if let Some(value) = headers.get(*name) {
            seen.insert(name.to_string(), json!(value.to_str().unwrap()));
        }
    }
    Json(json!({ "path": uri.path(), "headers": seen }))
}

/// Start a local upstream serving the echo handler; returns its origin.
pub async fn spawn_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local upstream");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, Router::new().fallback(echo))
            .await
            .expect("local upstream stopped");
    });
    format!("http://{addr}")
}

/// Test application wrapper around the real gate and routes.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Real verifier and locale router, echo handler behind the gate.
    pub fn new() -> Self {
        let verifier = Arc::new(JwtTokenVerifier::new(TEST_SECRET.as_bytes()));
        Self::with_collaborators(verifier, Arc::new(PrefixLocaleRouter))
    }

    pub fn with_collaborators(
        verifier: Arc<dyn TokenVerifier>,
        locale_router: Arc<dyn LocaleRouter>,
    ) -> Self {
        let state = AppState::with_collaborators(test_config(), verifier, locale_router)
            .expect("Failed to initialize AppState");
        let echo_router = Router::new().fallback(echo);
        let router = build_router_with(echo_router, state.clone());
        Self { router, state }
    }

    /// Production router (upstream forwarding) for the given config.
    pub fn forwarding(config: Config) -> Self {
        let state = AppState::new(&config).expect("Failed to initialize AppState");
        let router = build_router(state.clone());
        Self { router, state }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// GET with extra request headers.
    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> Response {
        let mut builder = Request::get(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

/// Collect a response body as text.
pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).expect("response body is UTF-8")
}

/// `Location` header of a redirect.
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get("location")
        .expect("response has a Location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// Header value as a string, if present.
pub fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).map(|v| v.to_str().unwrap())
}
