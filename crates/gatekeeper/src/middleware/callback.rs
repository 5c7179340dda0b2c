//! Login callback handling.
//!
//! Two directions:
//! - incoming: strip nested or self-referencing `callbackUrl` chains from
//!   the request URL before anything else runs;
//! - outgoing: build the `callbackUrl` attached to a login redirect.

use url::Url;

use crate::middleware::classify::is_auth_page;
use crate::middleware::language::split_locale_segment;
use crate::models::Locale;

pub const CALLBACK_PARAM: &str = "callbackUrl";
pub const MODAL_PARAM: &str = "modal";

/// Nesting depth at which a callback chain is dropped.
pub const MAX_CALLBACK_DEPTH: usize = 3;

/// Remove unsafe callback chains and the `modal` flag from a request URL.
///
/// Only applies when the URL carries a non-empty `callbackUrl`; any other
/// URL is returned unchanged. `callbackUrl` is removed when an unwrapped
/// value fails to decode, is not an absolute URL, points at an auth page, or nests
/// [`MAX_CALLBACK_DEPTH`] levels deep. Applying this twice yields the same
/// URL as applying it once.
pub fn sanitize_incoming(url: &Url) -> Url {
    let Some(callback) = first_param(url, CALLBACK_PARAM).filter(|v| !v.is_empty()) else {
        return url.clone();
    };

    let mut strip = vec![MODAL_PARAM];
    if callback_chain_is_unsafe(&callback) {
        strip.push(CALLBACK_PARAM);
    }

    let mut sanitized = url.clone();
    if remove_params(&mut sanitized, &strip) {
        tracing::debug!(from = %url, to = %sanitized, "sanitized callback url");
    }
    sanitized
}

fn callback_chain_is_unsafe(first: &str) -> bool {
    let mut current = first.to_string();
    let mut depth = 0;

    while depth < MAX_CALLBACK_DEPTH {
        let Ok(decoded) = urlencoding::decode(&current) else {
            return true;
        };
        // Relative values are rejected, not resolved against the request.
        let Ok(target) = Url::parse(&decoded) else {
            return true;
        };
        if is_auth_page(target.path()) {
            return true;
        }
        match first_param(&target, CALLBACK_PARAM).filter(|v| !v.is_empty()) {
            Some(nested) => {
                current = nested;
                depth += 1;
            }
            None => return false,
        }
    }

    true
}

/// Callback for a login redirect, re-based onto the public origin.
///
/// The locale comes from a supported path prefix, or the default. Returns
/// `None` for the home page, for auth pages and whenever the URL cannot be
/// rebuilt.
pub fn build_login_callback(url: &Url, public_origin: &Url) -> Option<Url> {
    let path = url.path();
    let (locale, rest) = match split_locale_segment(path) {
        Some(segment) => match Locale::from_code(segment.code) {
            Some(locale) if segment.rest.is_empty() => (locale, "/"),
            Some(locale) => (locale, segment.rest),
            None => (Locale::DEFAULT, path),
        },
        None => (Locale::DEFAULT, path),
    };

    if rest == "/" || is_auth_page(rest) {
        return None;
    }

    let mut callback = match public_origin.join(&format!("/{}{rest}", locale.code())) {
        Ok(callback) => callback,
        Err(e) => {
            tracing::debug!(error = %e, path = %path, "could not build login callback");
            return None;
        }
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .filter(|(k, _)| k != MODAL_PARAM && k != CALLBACK_PARAM)
        .collect();
    callback.set_query(None);
    if !kept.is_empty() {
        callback.query_pairs_mut().extend_pairs(kept);
    }
    callback.set_fragment(None);

    Some(callback)
}

/// Where an already-authenticated visitor on an auth page should land.
///
/// `raw` is the `callbackUrl` value, absolute or relative to the request.
/// The target must be http(s) on the request origin or the public origin
/// and must not be an auth page. `modal` is removed from it.
pub fn post_login_target(raw: &str, request_url: &Url, public_origin: &Url) -> Option<Url> {
    let decoded = urlencoding::decode(raw).ok()?;
    let mut target = request_url.join(&decoded).ok()?;

    if !matches!(target.scheme(), "http" | "https") {
        return None;
    }
    let origin = target.origin();
    if origin != request_url.origin() && origin != public_origin.origin() {
        tracing::debug!(target = %target, "ignoring cross-origin callback");
        return None;
    }
    if is_auth_page(target.path()) {
        return None;
    }

    remove_params(&mut target, &[MODAL_PARAM]);
    Some(target)
}

fn first_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// Remove every occurrence of the named query parameters.
///
/// The query is only re-serialized when something was removed, so an
/// untouched URL keeps its exact encoding. Returns whether anything changed.
fn remove_params(url: &mut Url, names: &[&str]) -> bool {
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let kept: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(k, _)| !names.contains(&k.as_str()))
        .collect();

    if kept.len() == pairs.len() {
        return false;
    }

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    true
}
