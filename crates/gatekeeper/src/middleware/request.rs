//! Per-request view the gate decides on.
//!
//! Built once per request from the URI and headers, never stored.

use std::collections::HashMap;

use axum::http::{HeaderMap, Uri, header};
use url::Url;

use crate::error::GateError;

/// Cookie holding the visitor's chosen locale code.
pub const LANGUAGE_COOKIE: &str = "preferred-language";

/// Cookie holding the visitor's chosen currency code.
pub const CURRENCY_COOKIE: &str = "preferred-currency";

/// Request data every gate stage works from.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// URL path with dot segments resolved (see [`normalize_uri`]).
    pub path: String,
    /// Decoded query pairs, in request order.
    pub query: Vec<(String, String)>,
    /// Cookie values, percent-decoded.
    pub cookies: HashMap<String, String>,
    /// Absolute request URL including the query string.
    pub url: Url,
}

impl RequestContext {
    /// Reconstruct the absolute request URL and parse query and cookies.
    ///
    /// Scheme and host come from `X-Forwarded-Proto`/`X-Forwarded-Host`,
    /// then `Host`. A missing or unusable host is replaced by the host of
    /// `fallback_origin`, so a hostile header never stops the gate.
    pub fn from_parts(
        uri: &Uri,
        headers: &HeaderMap,
        fallback_origin: &Url,
    ) -> Result<Self, GateError> {
        let scheme = first_header_value(headers, "x-forwarded-proto")
            .filter(|s| matches!(*s, "http" | "https"))
            .unwrap_or_else(|| fallback_origin.scheme());
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

        let claimed = first_header_value(headers, "x-forwarded-host")
            .or_else(|| first_header_value(headers, header::HOST.as_str()))
            .or_else(|| uri.authority().map(|a| a.as_str()));

        let url = match claimed.and_then(|host| request_url(scheme, host, path_and_query)) {
            Some(url) => url,
            None => {
                if let Some(host) = claimed {
                    tracing::warn!(host = %host, "unusable request host, using public origin");
                }
                let host = authority_of(fallback_origin).ok_or(GateError::InvalidHost)?;
                Url::parse(&format!("{scheme}://{host}{path_and_query}"))?
            }
        };

        let query = url.query_pairs().into_owned().collect();
        let cookies = parse_cookies(headers);

        Ok(Self {
            path: uri.path().to_string(),
            query,
            cookies,
            url,
        })
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_query_param(&self, name: &str) -> bool {
        self.query.iter().any(|(k, _)| k == name)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Parse every `Cookie` header into a name → value map.
///
/// Malformed pairs are skipped. Values are percent-decoded; a value that
/// does not decode to UTF-8 is kept raw. The first occurrence of a name
/// wins.
pub fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();

    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else {
            tracing::debug!("ignoring non-ASCII cookie header");
            continue;
        };

        for pair in value.split(';') {
            let Some((name, raw)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            let raw = raw.trim().trim_matches('"');
            if name.is_empty() || raw.is_empty() {
                continue;
            }
            let decoded = urlencoding::decode(raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            cookies.entry(name.to_string()).or_insert(decoded);
        }
    }

    cookies
}

/// Resolve `.` and `..` segments (including percent-encoded ones) in the
/// request path, the way the upstream origin will.
///
/// The gate classifies and forwards the returned URI, so the route it
/// decides on is the route that gets served. Non-origin-form targets such
/// as `*` are returned unchanged.
pub fn normalize_uri(uri: &Uri) -> Result<Uri, GateError> {
    let Some(raw) = uri.path_and_query().map(|pq| pq.as_str()) else {
        return Ok(uri.clone());
    };
    if !raw.starts_with('/') {
        return Ok(uri.clone());
    }

    let resolved = Url::parse(&format!("http://localhost{raw}"))?;
    let mut normalized = resolved.path().to_string();
    if let Some(query) = resolved.query() {
        normalized.push('?');
        normalized.push_str(query);
    }
    if normalized == raw {
        return Ok(uri.clone());
    }

    tracing::debug!(from = %raw, to = %normalized, "normalized request path");
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(normalized.parse().map_err(|_| GateError::InvalidPath)?);
    Uri::from_parts(parts).map_err(|_| GateError::InvalidPath)
}

fn request_url(scheme: &str, host: &str, path_and_query: &str) -> Option<Url> {
    if host.contains(['/', '\\', '?', '#', '@', ' ']) {
        return None;
    }
    Url::parse(&format!("{scheme}://{host}{path_and_query}"))
        .ok()
        .filter(|url| url.host_str().is_some_and(|h| !h.is_empty()))
}

fn first_header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn authority_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
