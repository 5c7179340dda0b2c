//! Access decisions for API and page routes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::{Value, json};
use url::Url;

use crate::error::GateError;
use crate::middleware::callback::{
    CALLBACK_PARAM, MODAL_PARAM, build_login_callback, post_login_target,
};
use crate::middleware::classify::RouteClass;
use crate::middleware::language::{path_locale, strip_locale};
use crate::middleware::request::RequestContext;
use crate::models::{Capability, Locale, Session, SessionClaims};
use crate::route_table::RouteTable;

/// Query flag that lets guest checkout proceed without a session.
pub const GUEST_PARAM: &str = "guest";

/// API path prefixes and the capability each one requires.
const API_ROLE_GATES: &[(&str, Capability)] = &[
    ("/api/admin", Capability::Administer),
    ("/api/staff", Capability::Staff),
    ("/api/manager", Capability::Manage),
    ("/api/lessor", Capability::Lease),
];

/// Terminal outcome of the access decision engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Let the request through, carrying the verified identity if any.
    Continue { identity: Option<SessionClaims> },
    RedirectTo(Url),
    JsonError { status: StatusCode, body: Value },
}

impl Decision {
    fn unauthorized() -> Self {
        Decision::JsonError {
            status: StatusCode::UNAUTHORIZED,
            body: json!({ "error": "Unauthorized", "message": "Authentication required" }),
        }
    }

    fn forbidden() -> Self {
        Decision::JsonError {
            status: StatusCode::FORBIDDEN,
            body: json!({ "error": "Insufficient permissions" }),
        }
    }

    /// Metric label for this outcome.
    pub fn outcome(&self) -> &'static str {
        match self {
            Decision::Continue { .. } => "continue",
            Decision::RedirectTo(_) => "redirect",
            Decision::JsonError { status, .. } if *status == StatusCode::FORBIDDEN => "forbidden",
            Decision::JsonError { .. } => "unauthorized",
        }
    }

    /// Response that ends the request, or `None` to let it through.
    pub fn response(self) -> Option<Response> {
        match self {
            Decision::Continue { .. } => None,
            Decision::RedirectTo(url) => Some(redirect(&url)),
            Decision::JsonError { status, body } => Some((status, Json(body)).into_response()),
        }
    }
}

/// Temporary (307) redirect that keeps the request method.
pub fn redirect(url: &Url) -> Response {
    Redirect::temporary(url.as_str()).into_response()
}

/// Decide an API request.
///
/// Role gates apply to every authenticated request, including ones to
/// public API routes.
pub fn decide_api(path: &str, class: RouteClass, session: Session, table: &RouteTable) -> Decision {
    if class == RouteClass::AuthApi {
        return Decision::Continue { identity: None };
    }

    let Some(claims) = session.into_claims() else {
        if table.is_public_api(path) {
            return Decision::Continue { identity: None };
        }
        tracing::debug!(path = %path, "anonymous request to protected api");
        return Decision::unauthorized();
    };

    let denied = API_ROLE_GATES.iter().any(|(prefix, capability)| {
        path.starts_with(prefix) && !claims.role.has_capability(*capability)
    });
    if denied {
        tracing::debug!(path = %path, role = %claims.role, "role not permitted for api");
        return Decision::forbidden();
    }

    Decision::Continue {
        identity: Some(claims),
    }
}

/// Inputs to a page decision.
#[derive(Debug)]
pub struct PageRequest<'a> {
    pub ctx: &'a RequestContext,
    pub class: RouteClass,
    pub session: Session,
    /// Validated `preferred-language` cookie.
    pub stored_locale: Option<Locale>,
    pub public_origin: &'a Url,
}

/// Decide a page request.
pub fn decide_page(request: PageRequest<'_>, table: &RouteTable) -> Result<Decision, GateError> {
    let PageRequest {
        ctx,
        class,
        session,
        stored_locale,
        public_origin,
    } = request;

    let locale = path_locale(&ctx.path)
        .or(stored_locale)
        .unwrap_or_default();

    match session.into_claims() {
        Some(claims) if class == RouteClass::AuthPage => {
            if let Some(target) = ctx
                .query_param(CALLBACK_PARAM)
                .and_then(|raw| post_login_target(raw, &ctx.url, public_origin))
            {
                tracing::debug!(target = %target, "signed-in visitor sent to callback");
                return Ok(Decision::RedirectTo(target));
            }

            let dashboard = ctx
                .url
                .join(&format!("/{}{}", locale.code(), claims.role.dashboard_path()))?;
            tracing::debug!(target = %dashboard, "signed-in visitor sent to dashboard");
            Ok(Decision::RedirectTo(dashboard))
        }
        Some(claims) => Ok(Decision::Continue {
            identity: Some(claims),
        }),
        None => {
            let page = strip_locale(&ctx.path);
            if table.is_public_page(page) {
                return Ok(Decision::Continue { identity: None });
            }

            if ctx.query_param(GUEST_PARAM) == Some("true") {
                tracing::debug!(path = %ctx.path, "allowing guest checkout");
                return Ok(Decision::Continue { identity: None });
            }

            let modal = ctx.query_param(MODAL_PARAM) == Some("true");
            if modal || (ctx.has_query_param(CALLBACK_PARAM) && class == RouteClass::AuthPage) {
                return Ok(Decision::Continue { identity: None });
            }

            let mut login = ctx.url.join(&format!("/{}/login", locale.code()))?;
            {
                let mut query = login.query_pairs_mut();
                query.append_pair(MODAL_PARAM, "true");
                if let Some(callback) = build_login_callback(&ctx.url, public_origin) {
                    query.append_pair(CALLBACK_PARAM, callback.as_str());
                }
            }
            tracing::debug!(path = %ctx.path, target = %login, "login required");
            Ok(Decision::RedirectTo(login))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::http::{HeaderMap, Uri};

    use super::*;
    use crate::middleware::classify::classify;
    use crate::models::Role;

    fn origin() -> Url {
        Url::parse("https://bandyscars.com").unwrap()
    }

    fn claims(role: Role) -> SessionClaims {
        SessionClaims {
            subject_id: "u-42".into(),
            role,
            email: Some("u42@example.com".into()),
        }
    }

    fn page(path_and_query: &str, session: Session, stored: Option<Locale>) -> Decision {
        let uri: Uri = path_and_query.parse().unwrap();
        let ctx = RequestContext::from_parts(&uri, &HeaderMap::new(), &origin()).unwrap();
        let table = RouteTable::default();
        let public_origin = origin();
        decide_page(
            PageRequest {
                ctx: &ctx,
                class: classify(&ctx.path, &table),
                session,
                stored_locale: stored,
                public_origin: &public_origin,
            },
            &table,
        )
        .unwrap()
    }

    fn api(path: &str, session: Session) -> Decision {
        let table = RouteTable::default();
        decide_api(path, classify(path, &table), session, &table)
    }

    fn redirect_target(decision: Decision) -> Url {
        match decision {
            Decision::RedirectTo(url) => url,
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    // --- API ---

    #[test]
    fn auth_api_always_continues() {
        assert_eq!(
            api("/api/auth/session", Session::Anonymous),
            Decision::Continue { identity: None }
        );
    }

    #[test]
    fn anonymous_protected_api_is_unauthorized() {
        let decision = api("/api/bookings", Session::Anonymous);
        assert_eq!(decision.outcome(), "unauthorized");
        let Decision::JsonError { status, body } = decision else {
            panic!("expected json error");
        };
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
        assert_eq!(body["message"], "Authentication required");
    }

    #[test]
    fn anonymous_public_api_continues() {
        for path in ["/api/cars", "/api/cars/123", "/api/webhooks/stripe", "/api/chat"] {
            assert_eq!(
                api(path, Session::Anonymous),
                Decision::Continue { identity: None },
                "{path}"
            );
        }
        assert_eq!(api("/api/carsharing", Session::Anonymous).outcome(), "unauthorized");
    }

    #[test]
    fn staff_on_admin_api_is_forbidden() {
        let decision = api("/api/admin/users", Session::Authenticated(claims(Role::Staff)));
        let Decision::JsonError { status, body } = decision else {
            panic!("expected json error");
        };
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "error": "Insufficient permissions" }));
    }

    #[test]
    fn role_gates() {
        let cases = [
            ("/api/admin/users", Role::Manager, true),
            ("/api/admin/users", Role::Admin, true),
            ("/api/admin/users", Role::Lessor, false),
            ("/api/staff/shifts", Role::Staff, true),
            ("/api/staff/shifts", Role::User, false),
            ("/api/manager/reports", Role::Manager, true),
            ("/api/manager/reports", Role::Staff, false),
            ("/api/lessor/cars", Role::Lessor, true),
            ("/api/lessor/cars", Role::Admin, true),
            ("/api/lessor/cars", Role::Manager, false),
            ("/api/bookings", Role::User, true),
        ];
        for (path, role, allowed) in cases {
            let decision = api(path, Session::Authenticated(claims(role)));
            assert_eq!(
                matches!(decision, Decision::Continue { identity: Some(_) }),
                allowed,
                "{path} as {role}"
            );
        }
    }

    // --- pages ---

    #[test]
    fn lessor_on_login_goes_to_dashboard() {
        let target = redirect_target(page(
            "/en-US/login",
            Session::Authenticated(claims(Role::Lessor)),
            None,
        ));
        assert_eq!(target.as_str(), "https://bandyscars.com/en-US/lessor-dashboard");
    }

    #[test]
    fn dashboard_locale_uses_stored_preference_without_path_locale() {
        let target = redirect_target(page(
            "/login",
            Session::Authenticated(claims(Role::Admin)),
            Some(Locale::FrFr),
        ));
        assert_eq!(target.path(), "/fr-FR/admin-dashboard");
    }

    #[test]
    fn signed_in_visitor_follows_callback() {
        let target = redirect_target(page(
            "/en-US/login?callbackUrl=%2Fen-US%2Fmybookings%3Fmodal%3Dtrue",
            Session::Authenticated(claims(Role::User)),
            None,
        ));
        assert_eq!(target.as_str(), "https://bandyscars.com/en-US/mybookings");
    }

    #[test]
    fn callback_to_auth_page_falls_back_to_dashboard() {
        let target = redirect_target(page(
            "/es-ES/login?callbackUrl=%2Fes-ES%2Fregister",
            Session::Authenticated(claims(Role::Staff)),
            None,
        ));
        assert_eq!(target.path(), "/es-ES/staff-dashboard");
    }

    #[test]
    fn guest_flag_lets_anonymous_through() {
        assert_eq!(
            page("/en-US/mybookings?guest=true", Session::Anonymous, None),
            Decision::Continue { identity: None }
        );
        assert_eq!(
            page("/en-US/booking-success/abc?guest=true", Session::Anonymous, None),
            Decision::Continue { identity: None }
        );
    }

    #[test]
    fn anonymous_private_page_redirects_to_login() {
        let target = redirect_target(page("/en-US/mybookings", Session::Anonymous, None));
        assert_eq!(target.path(), "/en-US/login");
        let pairs: Vec<(String, String)> = target.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("modal".to_string(), "true".to_string()),
                (
                    "callbackUrl".to_string(),
                    "https://bandyscars.com/en-US/mybookings".to_string()
                ),
            ]
        );
    }

    #[test]
    fn unknown_page_requires_session() {
        let target = redirect_target(page("/ar-MA/checkout?car=7", Session::Anonymous, None));
        assert_eq!(target.path(), "/ar-MA/login");
        assert!(target.query().unwrap().contains("car%3D7"));
    }

    #[test]
    fn modal_request_renders_in_place() {
        assert_eq!(
            page("/en-US/favorites?modal=true", Session::Anonymous, None),
            Decision::Continue { identity: None }
        );
    }

    #[test]
    fn public_pages_continue_anonymously() {
        for path in ["/fr-FR/cars/fleet", "/en-US/login", "/en-US/cars/abc-123", "/es-ES"] {
            assert_eq!(
                page(path, Session::Anonymous, None),
                Decision::Continue { identity: None },
                "{path}"
            );
        }
    }

    #[test]
    fn authenticated_page_carries_identity() {
        let decision = page(
            "/en-US/mybookings",
            Session::Authenticated(claims(Role::User)),
            None,
        );
        assert_eq!(
            decision,
            Decision::Continue {
                identity: Some(claims(Role::User))
            }
        );
    }
}
