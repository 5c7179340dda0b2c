//! Application error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failures inside the edge gate.
///
/// None of these reach the client as detail. A request path that cannot be
/// normalized is refused with 400; anything else is logged and the request
/// passes through.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("no usable host for the request url")]
    InvalidHost,

    #[error("request path cannot be normalized")]
    InvalidPath,

    #[error("locale routing failed: {0}")]
    LocaleRouting(String),
}

/// Reasons a session token was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("no session token present")]
    Missing,

    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token subject is empty")]
    EmptySubject,

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("token verification timed out")]
    Timeout,
}

/// Errors returned by route handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("not found")]
    NotFound,

    #[error("bad gateway")]
    BadGateway(#[from] reqwest::Error),

    #[error("payload too large")]
    PayloadTooLarge,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        };

        // Upstream and internal details stay in the logs.
        match &self {
            AppError::Internal(e) => tracing::error!(error = %e, "internal server error"),
            AppError::BadGateway(e) => tracing::warn!(error = %e, "upstream request failed"),
            _ => {}
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = AppError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_error_hides_details() {
        let err = AppError::Internal(anyhow::anyhow!("secret detail"));
        assert_eq!(err.to_string(), "internal server error");
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn token_error_messages() {
        assert_eq!(
            TokenError::UnknownRole("ROOT".to_string()).to_string(),
            "unknown role: ROOT"
        );
        assert_eq!(TokenError::Expired.to_string(), "token has expired");
    }
}
