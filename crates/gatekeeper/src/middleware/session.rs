//! Lazy session resolution.
//!
//! Public marketing pages never pay for token verification: the gate only
//! asks the verifier when the route class requires an identity.

use std::time::Duration;

use axum::http::{HeaderMap, header};

use crate::error::TokenError;
use crate::metrics::Metrics;
use crate::middleware::classify::RouteClass;
use crate::middleware::request::RequestContext;
use crate::models::Session;
use crate::services::TokenVerifier;

/// Session cookie set over HTTPS.
pub const SECURE_SESSION_COOKIE: &str = "__Secure-next-auth.session-token";

/// Session cookie set over plain HTTP (local development).
pub const SESSION_COOKIE: &str = "next-auth.session-token";

/// Whether a request of this class needs its session resolved.
///
/// Auth pages are included: a signed-in visitor on the login page is sent
/// to their dashboard.
pub fn needs_session(class: RouteClass) -> bool {
    matches!(
        class,
        RouteClass::ApiRoute | RouteClass::AuthPage | RouteClass::PrivateRoute | RouteClass::Other
    )
}

/// Raw session token: secure cookie, plain cookie, then bearer header.
pub fn extract_token<'a>(ctx: &'a RequestContext, headers: &'a HeaderMap) -> Option<&'a str> {
    ctx.cookie(SECURE_SESSION_COOKIE)
        .or_else(|| ctx.cookie(SESSION_COOKIE))
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)?
                .to_str()
                .ok()?
                .strip_prefix("Bearer ")
                .map(str::trim)
                .filter(|t| !t.is_empty())
        })
}

/// Verify the token, degrading every failure to [`Session::Anonymous`].
///
/// The verifier call is bounded by `timeout` and never retried.
pub async fn resolve_session(
    verifier: &dyn TokenVerifier,
    token: Option<&str>,
    timeout: Duration,
    metrics: &Metrics,
) -> Session {
    let result = match token {
        None => Err(TokenError::Missing),
        Some(token) => match tokio::time::timeout(timeout, verifier.verify(token)).await {
            Ok(result) => result,
            Err(_) => Err(TokenError::Timeout),
        },
    };

    match result {
        Ok(claims) => {
            metrics.record_verification("valid");
            Session::Authenticated(claims)
        }
        Err(TokenError::Missing) => Session::Anonymous,
        Err(e) => {
            metrics.record_verification(verification_label(&e));
            tracing::debug!(error = %e, "session token rejected, continuing anonymously");
            Session::Anonymous
        }
    }
}

fn verification_label(error: &TokenError) -> &'static str {
    match error {
        TokenError::Missing => "missing",
        TokenError::Expired => "expired",
        TokenError::Timeout => "timeout",
        TokenError::Invalid(_) | TokenError::EmptySubject | TokenError::UnknownRole(_) => {
            "invalid"
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::http::{HeaderValue, Uri};
    use url::Url;

    use super::*;
    use crate::models::{Role, SessionClaims};

    struct CountingVerifier {
        calls: AtomicUsize,
        result: Result<SessionClaims, TokenError>,
    }

    #[async_trait]
    impl TokenVerifier for CountingVerifier {
        async fn verify(&self, _token: &str) -> Result<SessionClaims, TokenError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    struct StalledVerifier;

    #[async_trait]
    impl TokenVerifier for StalledVerifier {
        async fn verify(&self, _token: &str) -> Result<SessionClaims, TokenError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(TokenError::Invalid("unreachable".into()))
        }
    }

    fn claims() -> SessionClaims {
        SessionClaims {
            subject_id: "u-1".into(),
            role: Role::Staff,
            email: None,
        }
    }

    fn context(headers: &HeaderMap) -> RequestContext {
        let uri: Uri = "/en-US/mybookings".parse().unwrap();
        RequestContext::from_parts(&uri, headers, &Url::parse("https://bandyscars.com").unwrap())
            .unwrap()
    }

    #[test]
    fn public_classes_skip_verification() {
        assert!(!needs_session(RouteClass::StaticAsset));
        assert!(!needs_session(RouteClass::AuthApi));
        assert!(!needs_session(RouteClass::PublicPage));
        assert!(needs_session(RouteClass::ApiRoute));
        assert!(needs_session(RouteClass::AuthPage));
        assert!(needs_session(RouteClass::PrivateRoute));
        assert!(needs_session(RouteClass::Other));
    }

    #[test]
    fn secure_cookie_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static(
                "next-auth.session-token=plain; __Secure-next-auth.session-token=secure",
            ),
        );
        headers.insert("authorization", HeaderValue::from_static("Bearer bearer"));
        let ctx = context(&headers);
        assert_eq!(extract_token(&ctx, &headers), Some("secure"));
    }

    #[test]
    fn bearer_header_is_last_resort() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        let ctx = context(&headers);
        assert_eq!(extract_token(&ctx, &headers), Some("abc.def.ghi"));

        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcg=="));
        let ctx = context(&headers);
        assert_eq!(extract_token(&ctx, &headers), None);
    }

    #[tokio::test]
    async fn missing_token_never_calls_verifier() {
        let verifier = CountingVerifier {
            calls: AtomicUsize::new(0),
            result: Ok(claims()),
        };
        let metrics = Metrics::new();
        let session = resolve_session(&verifier, None, Duration::from_secs(1), &metrics).await;
        assert_eq!(session, Session::Anonymous);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_token_authenticates() {
        let verifier = CountingVerifier {
            calls: AtomicUsize::new(0),
            result: Ok(claims()),
        };
        let metrics = Metrics::new();
        let session =
            resolve_session(&verifier, Some("t"), Duration::from_secs(1), &metrics).await;
        assert_eq!(session, Session::Authenticated(claims()));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
        assert!(
            metrics
                .encode()
                .contains("gate_token_verifications_total{result=\"valid\"} 1")
        );
    }

    #[tokio::test]
    async fn verifier_error_degrades_to_anonymous() {
        let verifier = CountingVerifier {
            calls: AtomicUsize::new(0),
            result: Err(TokenError::Expired),
        };
        let metrics = Metrics::new();
        let session =
            resolve_session(&verifier, Some("t"), Duration::from_secs(1), &metrics).await;
        assert_eq!(session, Session::Anonymous);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_verifier_times_out() {
        let metrics = Metrics::new();
        let session =
            resolve_session(&StalledVerifier, Some("t"), Duration::from_millis(50), &metrics)
                .await;
        assert_eq!(session, Session::Anonymous);
        assert!(
            metrics
                .encode()
                .contains("gate_token_verifications_total{result=\"timeout\"} 1")
        );
    }
}
