//! Session identity resolved from a verified token.

use super::Role;

/// Identity claims taken from a cryptographically valid, unexpired token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Opaque user identifier; never empty.
    pub subject_id: String,
    pub role: Role,
    /// Display-only email address.
    pub email: Option<String>,
}

/// Whether the current request carries a verified session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    Authenticated(SessionClaims),
    #[default]
    Anonymous,
}

impl Session {
    pub fn into_claims(self) -> Option<SessionClaims> {
        match self {
            Session::Authenticated(claims) => Some(claims),
            Session::Anonymous => None,
        }
    }
}
