//! Carhire test utilities.
//!
//! Helpers for integration testing: session token minting that matches what
//! the authentication service issues.

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

/// Signing secret shared by tests and the test configuration.
pub const TEST_SECRET: &str = "integration-test-secret-of-sufficient-length";

/// Sign arbitrary claims with HS256.
///
/// # Panics
///
/// Panics if the claims cannot be serialized (never for JSON values).
#[allow(clippy::expect_used)]
pub fn sign_claims(secret: &str, claims: &Value) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("JSON claims always encode")
}

/// Mint a session token valid for one hour.
///
/// `role` is passed through verbatim so tests can also mint unknown roles.
pub fn mint_session_token(secret: &str, subject: &str, role: &str, email: Option<&str>) -> String {
    let mut claims = json!({
        "id": subject,
        "role": role,
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    if let Some(email) = email {
        claims["email"] = json!(email);
    }
    sign_claims(secret, &claims)
}

/// Mint a session token that expired an hour ago.
pub fn expired_session_token(secret: &str, subject: &str, role: &str) -> String {
    sign_claims(
        secret,
        &json!({
            "id": subject,
            "role": role,
            "exp": chrono::Utc::now().timestamp() - 3600,
        }),
    )
}

/// `Cookie` header value carrying a session token.
pub fn session_cookie(token: &str) -> String {
    format!("__Secure-next-auth.session-token={token}")
}
