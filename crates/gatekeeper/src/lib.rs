//! Carhire edge gatekeeper library.
//!
//! Exposes the gate, its collaborators and the router for integration
//! testing. The server entry point is the `carhire-edge` binary.

pub mod app;
pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod route_table;
pub mod routes;
pub mod services;
pub mod state;

pub use app::{build_router, build_router_with};
pub use config::Config;
pub use error::{AppError, GateError, TokenError};
pub use state::AppState;
