//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use url::Url;

/// Origin used for callback URLs when no override is configured.
pub const DEFAULT_PUBLIC_ORIGIN: &str = "https://bandyscars.com";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// HMAC secret the session tokens are signed with.
    pub session_secret: String,

    /// Public origin that post-login callback URLs are re-based onto.
    ///
    /// Resolved from `PUBLIC_ORIGIN`, then `NEXTAUTH_URL`, then
    /// `NEXT_PUBLIC_APP_URL`, then [`DEFAULT_PUBLIC_ORIGIN`].
    pub public_origin: Url,

    /// Origin of the page renderer and API handlers. When unset, requests
    /// the gate lets through end at a 404.
    pub upstream_url: Option<Url>,

    /// Upper bound on a single session token verification (default: 2s).
    pub token_verify_timeout: Duration,

    /// Timeout for forwarded upstream requests (default: 30s).
    pub upstream_timeout: Duration,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let Some(session_secret) = lookup("NEXTAUTH_SECRET")
            .or_else(|| lookup("SESSION_SECRET"))
            .filter(|s| !s.is_empty())
        else {
            bail!("NEXTAUTH_SECRET (or SESSION_SECRET) environment variable is required");
        };
        if session_secret.len() < 32 {
            tracing::warn!("session secret is shorter than 32 bytes");
        }

        let public_origin = resolve_public_origin(&lookup)?;

        let upstream_url = lookup("UPSTREAM_URL")
            .filter(|s| !s.is_empty())
            .map(|s| Url::parse(&s))
            .transpose()
            .context("UPSTREAM_URL must be an absolute URL")?;

        let token_verify_timeout = lookup("TOKEN_VERIFY_TIMEOUT_MS")
            .unwrap_or_else(|| "2000".to_string())
            .parse()
            .map(Duration::from_millis)
            .context("TOKEN_VERIFY_TIMEOUT_MS must be a valid u64")?;

        let upstream_timeout = lookup("UPSTREAM_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map(Duration::from_secs)
            .context("UPSTREAM_TIMEOUT_SECS must be a valid u64")?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["*".to_string()]);

        Ok(Self {
            port,
            session_secret,
            public_origin,
            upstream_url,
            token_verify_timeout,
            upstream_timeout,
            cors_allowed_origins,
        })
    }
}

/// First non-empty entry of the public origin fallback chain.
fn resolve_public_origin(lookup: &impl Fn(&str) -> Option<String>) -> Result<Url> {
    let raw = ["PUBLIC_ORIGIN", "NEXTAUTH_URL", "NEXT_PUBLIC_APP_URL"]
        .into_iter()
        .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_PUBLIC_ORIGIN.to_string());

    let parsed = Url::parse(raw.trim()).context("public origin must be an absolute URL")?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        bail!("public origin must be an http(s) URL with a host");
    }

    // Only the origin matters; any path on e.g. NEXTAUTH_URL is dropped.
    Url::parse(&parsed.origin().ascii_serialization()).context("invalid public origin")
}
