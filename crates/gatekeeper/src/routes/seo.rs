//! Crawler documents: robots.txt and the sitemaps.
//!
//! All absolute URLs use the configured public origin, never the host the
//! request arrived on.

use std::fmt::Write;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use crate::error::{AppError, AppResult};
use crate::models::Locale;
use crate::state::AppState;

/// Paths every crawler is asked to skip.
const DISALLOWED_PATHS: &[&str] = &[
    "/api/",
    "/admin-dashboard/",
    "/admin-bookings/",
    "/admin-careers/",
    "/admin-cronjob-booking/",
    "/calendar-overview/",
    "/document-verification/",
    "/email-tracking/",
    "/manage-bookings-admin/",
    "/manage-document-admin/",
    "/manage-enterprise-admin/",
    "/manage-fleet-admin/",
    "/manage-support-admin/",
    "/manage-users-admin/",
    "/vehicle-tracking/",
    "/test/",
    "/manage-document-manager/",
    "/manage-fleet-manager/",
    "/manage-support-manager/",
    "/manage-users-manager/",
    "/handle-contracts/",
    "/handle-maintenance/",
    "/handle-payments/",
    "/handle-rentals/",
    "/staff-dashboard/",
    "/staff/",
    "/lessor-dashboard/",
    "/lessor/",
    "/lessor-bookings/",
    "/lessor-maintenance/",
    "/lessor-management/",
    "/lessor-application/",
    "/lessor-calendar/",
    "/lessor-contracts/",
    "/lessor-revenue/",
    "/lessor-support/",
    "/booking-confirmation/",
    "/booking-success/",
    "/favorites/",
    "/loyalty-program/",
    "/mybookings/",
    "/mydocuments/",
    "/user-dashboard/",
    "/stripe-booking-confirmation/",
    "/after-login/",
    "/login/",
    "/*?*checkout*",
    "/*?*session*",
    "/*/checkout/*",
    "/*/booking/*/payment",
    "/*/booking/*/confirmation",
];

const ALLOWED_PATHS: &[&str] = &["/", "/cars/fleet"];

/// User agents with their own rule group; `Some` is a crawl delay in seconds.
const CRAWLERS: &[(&str, Option<u32>)] = &[("*", None), ("Googlebot", Some(1)), ("Bingbot", Some(1))];

/// One page listed in a locale sitemap.
#[derive(Debug, Clone, Copy)]
struct SitemapPage {
    /// Path after the locale segment; empty for the locale home page.
    path: &'static str,
    priority: f32,
    change_frequency: &'static str,
}

const fn page(path: &'static str, priority: f32, change_frequency: &'static str) -> SitemapPage {
    SitemapPage {
        path,
        priority,
        change_frequency,
    }
}

const STATIC_PAGES: &[SitemapPage] = &[
    page("", 1.0, "weekly"),
    page("/about", 0.8, "monthly"),
    page("/legal", 0.6, "yearly"),
    page("/privacy-policy", 0.6, "yearly"),
    page("/terms-of-service", 0.6, "yearly"),
    page("/faqs", 0.7, "monthly"),
    page("/press", 0.5, "monthly"),
    page("/careers", 0.6, "weekly"),
    page("/bandyscars-guide", 0.7, "monthly"),
    page("/partnership", 0.6, "monthly"),
    page("/our-offices", 0.7, "monthly"),
    page("/cancellation-policy", 0.6, "yearly"),
    page("/community-guidelines", 0.5, "yearly"),
    page("/nondiscrimination-policy", 0.5, "yearly"),
    page("/how-bandys-works", 0.8, "monthly"),
    page("/support", 0.7, "weekly"),
    page("/cars/fleet", 0.9, "daily"),
];

/// Location landing pages.
const LOCATION_PAGES: &[SitemapPage] = &[
    page("/location-agadir", 0.8, "weekly"),
    page("/location-casablanca", 0.9, "weekly"),
    page("/location-fes", 0.8, "weekly"),
    page("/location-marrakech", 0.9, "weekly"),
    page("/location-rabat", 0.8, "weekly"),
    page("/location-tanger", 0.8, "weekly"),
];

/// Create the robots and sitemap router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/robots.txt", get(robots_txt))
        .route("/sitemap.xml", get(sitemap_index))
        .route("/{locale}/sitemap.xml", get(locale_sitemap))
}

async fn robots_txt(State(state): State<AppState>) -> Response {
    let body = render_robots(&public_base(&state));
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

async fn sitemap_index(State(state): State<AppState>) -> Response {
    xml_response(render_sitemap_index(&public_base(&state), &today()))
}

async fn locale_sitemap(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> AppResult<Response> {
    let locale = Locale::from_code(&locale).ok_or(AppError::NotFound)?;
    Ok(xml_response(render_locale_sitemap(
        &public_base(&state),
        locale,
        &today(),
    )))
}

/// Public origin without a trailing slash.
fn public_base(state: &AppState) -> String {
    state.config().public_origin.origin().ascii_serialization()
}

fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

fn xml_response(body: String) -> Response {
    (
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        body,
    )
        .into_response()
}

fn render_robots(base: &str) -> String {
    let mut out = String::new();
    for (agent, crawl_delay) in CRAWLERS {
        let _ = writeln!(out, "User-Agent: {agent}");
        for path in ALLOWED_PATHS {
            let _ = writeln!(out, "Allow: {path}");
        }
        for path in DISALLOWED_PATHS {
            let _ = writeln!(out, "Disallow: {path}");
        }
        if let Some(delay) = crawl_delay {
            let _ = writeln!(out, "Crawl-delay: {delay}");
        }
        out.push('\n');
    }
    let _ = writeln!(out, "Host: {base}");
    let _ = writeln!(out, "Sitemap: {base}/sitemap.xml");
    out
}

fn render_sitemap_index(base: &str, lastmod: &str) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for locale in Locale::ALL {
        let loc = xml_escape(&format!("{base}/{}/sitemap.xml", locale.code()));
        let _ = writeln!(
            out,
            "<sitemap><loc>{loc}</loc><lastmod>{lastmod}</lastmod></sitemap>"
        );
    }
    out.push_str("</sitemapindex>\n");
    out
}

fn render_locale_sitemap(base: &str, locale: Locale, lastmod: &str) -> String {
    let mut pages: Vec<SitemapPage> = STATIC_PAGES
        .iter()
        .chain(LOCATION_PAGES)
        .copied()
        .collect();
    // Stable: equal priorities keep table order.
    pages.sort_by(|a, b| b.priority.total_cmp(&a.priority));

    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for page in pages {
        let loc = xml_escape(&format!("{base}/{}{}", locale.code(), page.path));
        let _ = writeln!(
            out,
            "<url><loc>{loc}</loc><lastmod>{lastmod}</lastmod>\
             <changefreq>{}</changefreq><priority>{:.1}</priority></url>",
            page.change_frequency, page.priority
        );
    }
    out.push_str("</urlset>\n");
    out
}

/// XML-escape a string for element content.
fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
