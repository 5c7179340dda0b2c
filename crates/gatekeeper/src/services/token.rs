//! Session token verification.
//!
//! Session tokens are HS256 JWTs issued by the authentication service and
//! carried in the session cookie (or an `Authorization: Bearer` header).
//! The gate only verifies them; it never issues or refreshes tokens.

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::TokenError;
use crate::models::{Role, SessionClaims};

/// Verifies a raw session token and extracts its identity claims.
///
/// Implementations must report every failure through [`TokenError`];
/// callers treat any error as an anonymous request.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<SessionClaims, TokenError>;
}

/// Token payload as written by the authentication service.
///
/// The user ID is carried as `id`; `sub` is accepted as a fallback.
#[derive(Debug, Deserialize)]
struct SessionTokenPayload {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    role: String,
    #[serde(default)]
    email: Option<String>,
}

/// HMAC-SHA256 JWT verifier.
pub struct JwtTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Session tokens are not audience-scoped.
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Synchronous verification, shared by the async trait impl.
    pub fn verify_token(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let data =
            jsonwebtoken::decode::<SessionTokenPayload>(token, &self.decoding_key, &self.validation)
                .map_err(|e| match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid(e.to_string()),
                })?;

        let payload = data.claims;
        let subject_id = payload
            .id
            .or(payload.sub)
            .filter(|s| !s.trim().is_empty())
            .ok_or(TokenError::EmptySubject)?;

        let role = payload
            .role
            .parse::<Role>()
            .map_err(|e| TokenError::UnknownRole(e.0))?;

        Ok(SessionClaims {
            subject_id,
            role,
            email: payload.email.filter(|e| !e.is_empty()),
        })
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.verify_token(token)
    }
}

impl std::fmt::Debug for JwtTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenVerifier").finish_non_exhaustive()
    }
}
