//! Fallback handler forwarding allowed requests to the upstream origin.
//!
//! The gate runs before this handler, so the request already carries the
//! identity and locale headers the gate added.

use anyhow::Context;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::response::Response;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Largest request body buffered for forwarding.
const MAX_FORWARD_BODY: usize = 10 * 1024 * 1024;

/// Connection-scoped headers never copied between hops.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Forward the request upstream and stream the answer back.
///
/// Without a configured upstream every request ends in 404.
pub async fn forward(State(state): State<AppState>, request: Request) -> AppResult<Response> {
    let Some(upstream) = state.config().upstream_url.as_ref() else {
        return Err(AppError::NotFound);
    };

    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = upstream
        .join(path_and_query)
        .context("invalid upstream request path")?;

    let body = axum::body::to_bytes(body, MAX_FORWARD_BODY)
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "request body rejected for forwarding");
            AppError::PayloadTooLarge
        })?;

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    headers.remove(axum::http::header::HOST);
    headers.remove(axum::http::header::CONTENT_LENGTH);

    tracing::debug!(method = %parts.method, target = %target, "forwarding upstream");
    let upstream_response = state
        .upstream_client()
        .request(parts.method, target)
        .headers(headers)
        .body(body)
        .send()
        .await?;

    let status = upstream_response.status();
    let mut response_headers = upstream_response.headers().clone();
    strip_hop_by_hop(&mut response_headers);

    let mut response = Response::new(Body::from_stream(upstream_response.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(*name);
    }
}
