//! Public, private and public-API path tables.
//!
//! All tables are process-wide constants. [`RouteTable`] bundles them so
//! the gate consults one value for every membership question, and so that
//! overlaps between the public and private tables can be reported at
//! startup instead of silently resolved.

/// Page paths reachable without a session (matched exactly or as `path/…`).
pub const PUBLIC_PAGE_PATHS: &[&str] = &[
    "/",
    "/login",
    "/register",
    "/verify-email",
    "/verify-email-pending",
    "/set-password",
    "/reset-password",
    "/support",
    "/cars/fleet",
    "/cars",
    "/about",
    "/legal",
    "/forgot-password",
    "/privacy-policy",
    "/terms-of-service",
    "/sitemap",
    "/faqs",
    "/press",
    "/careers",
    "/bandyscars-guide",
    "/partnership",
    "/bandys-for-enterprise",
    "/our-offices",
    "/cancellation-policy",
    "/community-guidelines",
    "/nondiscrimination-policy",
    "/how-bandys-works",
    "/location-agadir",
    "/location-casablanca",
    "/location-fes",
    "/location-marrakech",
    "/location-rabat",
    "/location-tanger",
    "/robots.txt",
    "/sitemap.xml",
    "/api/chat",
];

/// Broad public prefixes: every car detail page and every location page.
pub const PUBLIC_PAGE_PREFIXES: &[&str] = &["/cars/", "/location-"];

/// Prefixes of gated areas that must not be indexed.
pub const PRIVATE_ROUTE_PREFIXES: &[&str] = &[
    "/admin",
    "/manage-",
    "/staff",
    "/handle-",
    "/lessor",
    "/booking-confirmation",
    "/booking-success",
    "/favorites",
    "/loyalty-program",
    "/mybookings",
    "/mydocuments",
    "/user-dashboard",
    "/stripe-booking-confirmation",
    "/after-login",
    "/booking/",
    "/vehicles/",
    "/accounting/",
    "/contracts/",
    "/calendar-overview",
    "/document-verification",
    "/email-tracking",
    "/vehicle-tracking",
];

/// API routes callable without a session (matched exactly or as `route/…`).
pub const PUBLIC_API_ROUTES: &[&str] = &[
    "/api/location",
    "/api/reviews",
    "/api/careers/upload-cv",
    "/api/fleet",
    "/api/cars",
    "/api/support/tickets",
    "/api/cron",
    "/api/test-email",
    "/api/webhooks/stripe",
    "/api/webhooks",
    "/api/vehicles/pricing",
    "/api/chat",
    "/api/get-signed-url",
    "/api/stripe-payment",
    "/api/test-booking",
    "/api/verify-email",
    "/api/set-password",
    "/api/enterprise/contact",
];

/// Immutable view over the route tables.
#[derive(Debug, Clone, Copy)]
pub struct RouteTable {
    public_paths: &'static [&'static str],
    public_prefixes: &'static [&'static str],
    private_prefixes: &'static [&'static str],
    public_api_routes: &'static [&'static str],
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(
            PUBLIC_PAGE_PATHS,
            PUBLIC_PAGE_PREFIXES,
            PRIVATE_ROUTE_PREFIXES,
            PUBLIC_API_ROUTES,
        )
    }
}

impl RouteTable {
    pub const fn new(
        public_paths: &'static [&'static str],
        public_prefixes: &'static [&'static str],
        private_prefixes: &'static [&'static str],
        public_api_routes: &'static [&'static str],
    ) -> Self {
        Self {
            public_paths,
            public_prefixes,
            private_prefixes,
            public_api_routes,
        }
    }

    /// Whether a locale-stripped page path is reachable without a session.
    pub fn is_public_page(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| matches_path(path, p))
            || self.public_prefixes.iter().any(|p| path.starts_with(p))
    }

    /// Whether a locale-stripped page path belongs to a gated, unindexed area.
    pub fn is_private(&self, path: &str) -> bool {
        self.private_prefixes.iter().any(|p| path.starts_with(p))
    }

    /// Whether an API path is on the anonymous allow-list.
    pub fn is_public_api(&self, path: &str) -> bool {
        self.public_api_routes.iter().any(|r| matches_path(path, r))
    }

    /// Paths that both tables claim.
    ///
    /// Each private prefix is probed with a representative child path and
    /// each public path with itself and a child path. The gate treats the
    /// public table as authoritative for authentication and the private
    /// table for indexing, so an overlap means a page that is reachable
    /// anonymously yet marked `noindex` (or the reverse intent was lost).
    pub fn overlaps(&self) -> Vec<String> {
        let mut found = Vec::new();

        for prefix in self.private_prefixes {
            let probe = probe_path(prefix);
            if self.is_public_page(&probe) {
                found.push(probe);
            }
        }

        for path in self.public_paths {
            for probe in [path.to_string(), probe_path(path)] {
                if self.is_private(&probe) && !found.contains(&probe) {
                    found.push(probe);
                }
            }
        }

        found
    }
}

/// Exact match or a descendant path (`/cars` matches `/cars/1`, not `/carsx`).
fn matches_path(path: &str, entry: &str) -> bool {
    path == entry
        || path
            .strip_prefix(entry)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn probe_path(prefix: &str) -> String {
    if prefix.ends_with('/') || prefix.ends_with('-') {
        format!("{prefix}probe")
    } else {
        format!("{prefix}/probe")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn public_pages_match_exactly_and_by_descendant() {
        let table = RouteTable::default();
        assert!(table.is_public_page("/"));
        assert!(table.is_public_page("/about"));
        assert!(table.is_public_page("/about/team"));
        assert!(!table.is_public_page("/aboutus"));
        assert!(!table.is_public_page("/mybookings"));
    }

    #[test]
    fn broad_prefixes_are_public() {
        let table = RouteTable::default();
        assert!(table.is_public_page("/cars/123"));
        assert!(table.is_public_page("/cars/fleet"));
        assert!(table.is_public_page("/location-ouarzazate"));
    }

    #[test]
    fn root_entry_does_not_make_everything_public() {
        let table = RouteTable::default();
        // "/" only matches itself; "//x" style descendants are not real pages.
        assert!(!table.is_public_page("/admin-dashboard"));
    }

    #[test]
    fn private_prefixes() {
        let table = RouteTable::default();
        assert!(table.is_private("/admin-dashboard"));
        assert!(table.is_private("/manage-fleet-admin"));
        assert!(table.is_private("/vehicles/42"));
        assert!(!table.is_private("/vehicles"));
        assert!(!table.is_private("/cars/fleet"));
    }

    #[test]
    fn public_api_allow_list() {
        let table = RouteTable::default();
        assert!(table.is_public_api("/api/fleet"));
        assert!(table.is_public_api("/api/webhooks/stripe"));
        assert!(table.is_public_api("/api/cars/12/availability"));
        assert!(!table.is_public_api("/api/fleetx"));
        assert!(!table.is_public_api("/api/bookings"));
    }

    #[test]
    fn standard_tables_do_not_overlap() {
        assert!(RouteTable::default().overlaps().is_empty());
    }

    #[test]
    fn overlap_is_reported() {
        static PUBLIC: &[&str] = &["/", "/vehicles"];
        static PRIVATE: &[&str] = &["/vehicles/", "/mybookings"];
        let table = RouteTable::new(PUBLIC, &[], PRIVATE, &[]);
        assert_eq!(table.overlaps(), vec!["/vehicles/probe".to_string()]);
    }
}
