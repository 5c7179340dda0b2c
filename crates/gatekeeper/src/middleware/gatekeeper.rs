//! Edge gate middleware.
//!
//! Runs on every request before any handler:
//!
//! 1. drop client-supplied identity headers, resolve dot segments in the
//!    path, classify it; static assets pass straight through
//! 2. sanitize incoming callback chains (redirect if anything changed)
//! 3. API routes: verify the session, apply the API decision
//! 4. page routes: stored-language redirect, lazy session verification,
//!    page decision, locale-prefix routing, response headers
//!
//! A path that cannot be normalized is refused. Any other internal failure
//! is logged and the request passes through unchanged.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::GateError;
use crate::middleware::access::{self, Decision, PageRequest, decide_api, decide_page};
use crate::middleware::callback::sanitize_incoming;
use crate::middleware::classify::{RouteClass, classify};
use crate::middleware::finalize::{
    HeaderPair, X_LOCALE, apply_headers, identity_headers, page_headers, strip_identity_headers,
};
use crate::middleware::language::{LocaleRouting, preferred_locale_redirect, stored_locale};
use crate::middleware::request::{RequestContext, normalize_uri};
use crate::middleware::session::{extract_token, needs_session, resolve_session};
use crate::models::Session;
use crate::state::AppState;

/// What the gate does with a request.
enum Verdict {
    /// Answer without calling the inner service.
    Respond(Response),
    /// Call the inner service with extra request headers, then add
    /// response headers to whatever it returns.
    Forward {
        request_headers: Vec<HeaderPair>,
        response_headers: Vec<HeaderPair>,
    },
    /// Call the inner service untouched.
    PassThrough,
}

/// Gate middleware, installed with `axum::middleware::from_fn_with_state`.
pub async fn gate_request(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    // Only the gate may set identity headers, on every route class.
    strip_identity_headers(request.headers_mut());

    match normalize_uri(request.uri()) {
        Ok(uri) => *request.uri_mut() = uri,
        Err(e) => {
            tracing::warn!(error = %e, path = %request.uri().path(), "rejecting unparseable path");
            state.metrics().record_decision("rejected");
            return StatusCode::BAD_REQUEST.into_response();
        }
    }

    let class = classify(request.uri().path(), state.route_table());
    if class == RouteClass::StaticAsset {
        return next.run(request).await;
    }

    let start = Instant::now();
    let method = request.method().to_string();

    let verdict = evaluate(&state, class, request.uri(), request.headers()).await;

    let response = match verdict {
        Ok(Verdict::Respond(response)) => response,
        Ok(Verdict::Forward {
            request_headers,
            response_headers,
        }) => {
            apply_headers(request.headers_mut(), &request_headers);
            let mut response = next.run(request).await;
            apply_headers(response.headers_mut(), &response_headers);
            response
        }
        Ok(Verdict::PassThrough) => next.run(request).await,
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %request.uri().path(),
                "gate failed, passing request through"
            );
            state.metrics().record_decision("passthrough");
            next.run(request).await
        }
    };

    state.metrics().record_request(
        &method,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

async fn evaluate(
    state: &AppState,
    class: RouteClass,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<Verdict, GateError> {
    let config = state.config();
    let metrics = state.metrics();
    let ctx = RequestContext::from_parts(uri, headers, &config.public_origin)?;

    let sanitized = sanitize_incoming(&ctx.url);
    if sanitized != ctx.url {
        metrics.record_decision("sanitized");
        return Ok(Verdict::Respond(access::redirect(&sanitized)));
    }

    if class == RouteClass::AuthApi {
        metrics.record_decision("continue");
        return Ok(Verdict::PassThrough);
    }

    if class.is_api() {
        let session = verify(state, class, &ctx, headers).await;
        let decision = decide_api(&ctx.path, class, session, state.route_table());
        metrics.record_decision(decision.outcome());
        return Ok(match decision {
            Decision::Continue { identity } => Verdict::Forward {
                request_headers: identity.as_ref().map(identity_headers).unwrap_or_default(),
                response_headers: Vec::new(),
            },
            other => respond(other),
        });
    }

    let stored = stored_locale(&ctx);
    if let Some(target) = preferred_locale_redirect(&ctx.url, stored) {
        tracing::debug!(to = %target, "switching to stored language");
        metrics.record_decision("locale_redirect");
        return Ok(Verdict::Respond(access::redirect(&target)));
    }

    let session = verify(state, class, &ctx, headers).await;
    let decision = decide_page(
        PageRequest {
            ctx: &ctx,
            class,
            session,
            stored_locale: stored,
            public_origin: &config.public_origin,
        },
        state.route_table(),
    )?;
    metrics.record_decision(decision.outcome());

    let Decision::Continue { identity } = decision else {
        return Ok(respond(decision));
    };

    let response_headers = page_headers(&ctx, state.route_table(), identity.as_ref());
    let mut request_headers = identity.as_ref().map(identity_headers).unwrap_or_default();

    match state.locale_router().route(&ctx, headers) {
        Ok(LocaleRouting::Redirect(target)) => {
            metrics.record_decision("locale_redirect");
            let mut response = access::redirect(&target);
            apply_headers(response.headers_mut(), &response_headers);
            return Ok(Verdict::Respond(response));
        }
        Ok(LocaleRouting::Continue(locale)) => {
            request_headers.push((X_LOCALE, locale.code().to_string()));
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %ctx.path, "locale routing failed, continuing");
        }
    }

    Ok(Verdict::Forward {
        request_headers,
        response_headers,
    })
}

/// Resolve the session only when the route class needs one.
async fn verify(
    state: &AppState,
    class: RouteClass,
    ctx: &RequestContext,
    headers: &HeaderMap,
) -> Session {
    if !needs_session(class) {
        return Session::Anonymous;
    }
    resolve_session(
        state.verifier().as_ref(),
        extract_token(ctx, headers),
        state.config().token_verify_timeout,
        state.metrics(),
    )
    .await
}

fn respond(decision: Decision) -> Verdict {
    match decision.response() {
        Some(response) => Verdict::Respond(response),
        None => Verdict::PassThrough,
    }
}
