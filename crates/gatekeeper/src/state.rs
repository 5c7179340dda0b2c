//! Application state shared across the gate and all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::metrics::Metrics;
use crate::middleware::language::{LocaleRouter, PrefixLocaleRouter};
use crate::route_table::RouteTable;
use crate::services::{JwtTokenVerifier, TokenVerifier};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap. Everything inside is
/// immutable after construction.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    route_table: RouteTable,
    verifier: Arc<dyn TokenVerifier>,
    locale_router: Arc<dyn LocaleRouter>,
    metrics: Arc<Metrics>,
    upstream_client: reqwest::Client,
}

impl AppState {
    /// Build state with the JWT verifier and prefix locale routing.
    pub fn new(config: &Config) -> Result<Self> {
        let verifier = Arc::new(JwtTokenVerifier::new(config.session_secret.as_bytes()));
        Self::with_collaborators(config.clone(), verifier, Arc::new(PrefixLocaleRouter))
    }

    /// Build state around caller-supplied collaborators.
    pub fn with_collaborators(
        config: Config,
        verifier: Arc<dyn TokenVerifier>,
        locale_router: Arc<dyn LocaleRouter>,
    ) -> Result<Self> {
        // Upstream redirects are relayed to the client, not followed.
        let upstream_client = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("failed to build upstream HTTP client")?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                route_table: RouteTable::default(),
                verifier,
                locale_router,
                metrics: Arc::new(Metrics::new()),
                upstream_client,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Public, private and public-API path tables.
    pub fn route_table(&self) -> &RouteTable {
        &self.inner.route_table
    }

    /// Session token verifier.
    pub fn verifier(&self) -> &Arc<dyn TokenVerifier> {
        &self.inner.verifier
    }

    /// Locale-prefix routing for page requests.
    pub fn locale_router(&self) -> &Arc<dyn LocaleRouter> {
        &self.inner.locale_router
    }

    /// Get the metrics registry.
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.inner.metrics
    }

    /// HTTP client used to forward requests upstream.
    pub fn upstream_client(&self) -> &reqwest::Client {
        &self.inner.upstream_client
    }
}
