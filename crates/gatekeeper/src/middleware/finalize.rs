//! Response finalizer: preference, identity and robots headers.
//!
//! Every header is set on its own. A value that is not a valid header value
//! is logged and skipped; the rest still go out.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::middleware::language::{stored_locale, strip_locale};
use crate::middleware::request::{CURRENCY_COOKIE, RequestContext};
use crate::models::{Currency, Locale, SessionClaims};
use crate::route_table::RouteTable;

pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
pub const X_USER_ROLE: HeaderName = HeaderName::from_static("x-user-role");
pub const X_USER_EMAIL: HeaderName = HeaderName::from_static("x-user-email");
pub const X_CURRENCY: HeaderName = HeaderName::from_static("x-currency");
pub const X_HAS_CURRENCY_PREFERENCE: HeaderName =
    HeaderName::from_static("x-has-currency-preference");
pub const X_HAS_LANGUAGE_PREFERENCE: HeaderName =
    HeaderName::from_static("x-has-language-preference");
pub const X_LOCALE: HeaderName = HeaderName::from_static("x-locale");
pub const X_ROBOTS_TAG: HeaderName = HeaderName::from_static("x-robots-tag");

pub const ROBOTS_NOINDEX: &str = "noindex, nofollow";

/// A header to set, paired with its unvalidated value.
pub type HeaderPair = (HeaderName, String);

/// Remove identity headers a client may have sent itself.
pub fn strip_identity_headers(headers: &mut HeaderMap) {
    for name in [X_USER_ID, X_USER_ROLE, X_USER_EMAIL] {
        if headers.remove(&name).is_some() {
            tracing::debug!(header = %name, "dropped client-supplied identity header");
        }
    }
}

/// Identity headers for a verified session.
pub fn identity_headers(claims: &SessionClaims) -> Vec<HeaderPair> {
    let mut pairs = vec![
        (X_USER_ID, claims.subject_id.clone()),
        (X_USER_ROLE, claims.role.as_str().to_string()),
    ];
    if let Some(email) = &claims.email {
        pairs.push((X_USER_EMAIL, email.clone()));
    }
    pairs
}

/// Headers for a page response the gate lets through.
pub fn page_headers(
    ctx: &RequestContext,
    table: &RouteTable,
    identity: Option<&SessionClaims>,
) -> Vec<HeaderPair> {
    let currency = ctx.cookie(CURRENCY_COOKIE).and_then(Currency::from_code);
    let language: Option<Locale> = stored_locale(ctx);

    let mut pairs = vec![
        (X_CURRENCY, currency.unwrap_or_default().code().to_string()),
        (X_HAS_CURRENCY_PREFERENCE, currency.is_some().to_string()),
        (X_HAS_LANGUAGE_PREFERENCE, language.is_some().to_string()),
    ];
    if let Some(claims) = identity {
        pairs.extend(identity_headers(claims));
    }
    if table.is_private(strip_locale(&ctx.path)) {
        pairs.push((X_ROBOTS_TAG, ROBOTS_NOINDEX.to_string()));
    }
    pairs
}

/// Set each header, skipping values that are not valid header values.
pub fn apply_headers(headers: &mut HeaderMap, pairs: &[HeaderPair]) {
    for (name, value) in pairs {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name.clone(), value);
            }
            Err(e) => tracing::warn!(header = %name, error = %e, "skipping invalid header value"),
        }
    }
}
