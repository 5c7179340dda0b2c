//! Locale resolution.
//!
//! Every user-facing path carries exactly one locale. Precedence:
//! explicit path prefix → `preferred-language` cookie → default.
//!
//! Two stages use this module:
//! - the stored-preference redirect, which rewrites an existing locale
//!   segment when the visitor's cookie names a different one;
//! - the locale router, which adds a prefix to paths that have none.

use std::sync::LazyLock;

use axum::http::HeaderMap;
use regex::Regex;
use url::Url;

use crate::error::GateError;
use crate::middleware::request::{LANGUAGE_COOKIE, RequestContext};
use crate::models::Locale;

/// Leading `xx-XX` or `xx` path segment.
///
/// # Panics
///
/// Panics if the hard-coded regex literal is invalid (impossible in practice).
#[allow(clippy::expect_used)]
static LOCALE_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/([a-z]{2}-[A-Z]{2}|[a-z]{2})(?:/|$)").expect("valid regex literal")
});

/// A locale-shaped first path segment and what follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleSegment<'a> {
    /// Segment text, supported or not (`fr-FR`, `de`).
    pub code: &'a str,
    /// Remainder of the path: empty, or starting with `/`.
    pub rest: &'a str,
}

/// Split a locale-shaped first segment off a path.
///
/// Only matches a segment followed by `/` or end of path, so `/enterprise`
/// and `/cars` are left alone.
pub fn split_locale_segment(path: &str) -> Option<LocaleSegment<'_>> {
    let caps = LOCALE_SEGMENT.captures(path)?;
    let code = caps.get(1)?.as_str();
    let rest = path.get(1 + code.len()..)?;
    Some(LocaleSegment { code, rest })
}

/// Path with any locale-shaped prefix removed (`/fr-FR` → `/`).
pub fn strip_locale(path: &str) -> &str {
    match split_locale_segment(path) {
        Some(segment) if segment.rest.is_empty() => "/",
        Some(segment) => segment.rest,
        None => path,
    }
}

/// Supported locale named by the first path segment.
pub fn path_locale(path: &str) -> Option<Locale> {
    split_locale_segment(path).and_then(|segment| Locale::from_code(segment.code))
}

/// Locale stored in the `preferred-language` cookie, if it is supported.
pub fn stored_locale(ctx: &RequestContext) -> Option<Locale> {
    let raw = ctx.cookie(LANGUAGE_COOKIE)?;
    let locale = Locale::from_code(raw);
    if locale.is_none() {
        tracing::debug!(cookie = %raw, "ignoring unsupported language preference");
    }
    locale
}

/// Redirect target when the stored preference disagrees with the path.
///
/// Only fires when the path already carries a supported locale; paths
/// without one are left to the [`LocaleRouter`]. The rest of the path and
/// the query string are preserved.
pub fn preferred_locale_redirect(url: &Url, stored: Option<Locale>) -> Option<Url> {
    let stored = stored?;
    let segment = split_locale_segment(url.path())?;
    let current = Locale::from_code(segment.code)?;
    if current == stored {
        return None;
    }

    let mut target = url.clone();
    target.set_path(&format!("/{}{}", stored.code(), segment.rest));
    Some(target)
}

/// Parse Accept-Language header value into (language, quality) pairs,
/// sorted by quality descending (stable sort preserves original order for ties).
fn parse_accept_language(header: &str) -> Vec<(String, f32)> {
    let mut langs: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }

            let mut segments = part.split(';');
            let lang = segments.next()?.trim().to_lowercase();

            let quality = segments
                .find_map(|s| {
                    let s = s.trim();
                    s.strip_prefix("q=")
                        .and_then(|q| q.trim().parse::<f32>().ok())
                })
                .unwrap_or(1.0)
                .clamp(0.0, 1.0); // RFC 7231 §5.3.1: quality values are 0.000–1.000

            Some((lang, quality))
        })
        .filter(|(_, quality)| *quality > 0.0)
        .collect();

    langs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    langs
}

/// Best supported locale from the Accept-Language header.
///
/// Each entry is tried as a full tag first (`fr-fr`), then by its primary
/// subtag (`fr`).
pub fn negotiate_accept_language(headers: &HeaderMap) -> Option<Locale> {
    let header = headers.get("accept-language")?.to_str().ok()?;

    for (lang, _quality) in parse_accept_language(header) {
        if let Some(locale) = Locale::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(&lang))
        {
            return Some(locale);
        }
        if let Some(primary) = lang.split('-').next()
            && let Some(locale) = Locale::ALL.into_iter().find(|l| l.language() == primary)
        {
            return Some(locale);
        }
    }

    None
}

/// Result of locale-prefix routing for a page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleRouting {
    /// The path already names this locale.
    Continue(Locale),
    /// The path needs a locale prefix.
    Redirect(Url),
}

/// Locale-prefix routing applied to page requests the gate lets through.
///
/// Called inside a failure-isolating wrapper: an `Err` makes the gate pass
/// the request through unchanged.
pub trait LocaleRouter: Send + Sync {
    fn route(&self, ctx: &RequestContext, headers: &HeaderMap)
    -> Result<LocaleRouting, GateError>;
}

/// Always-prefix routing: paths without a supported locale are redirected
/// to `/{locale}{path}`, keeping the query string.
///
/// Locale choice: stored preference → Accept-Language → default.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrefixLocaleRouter;

impl LocaleRouter for PrefixLocaleRouter {
    fn route(
        &self,
        ctx: &RequestContext,
        headers: &HeaderMap,
    ) -> Result<LocaleRouting, GateError> {
        if let Some(locale) = path_locale(&ctx.path) {
            return Ok(LocaleRouting::Continue(locale));
        }

        if ctx.url.cannot_be_a_base() {
            return Err(GateError::LocaleRouting(format!(
                "cannot prefix opaque url {}",
                ctx.url
            )));
        }

        let locale = stored_locale(ctx)
            .or_else(|| negotiate_accept_language(headers))
            .unwrap_or_default();

        let path = ctx.url.path();
        let prefixed = if path == "/" {
            format!("/{}", locale.code())
        } else {
            format!("/{}{path}", locale.code())
        };

        let mut target = ctx.url.clone();
        target.set_path(&prefixed);
        tracing::debug!(from = %ctx.url, to = %target, "adding locale prefix");
        Ok(LocaleRouting::Redirect(target))
    }
}
