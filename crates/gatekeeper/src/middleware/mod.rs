//! Edge gate middleware and the stages it is built from.

pub mod access;
pub mod callback;
pub mod classify;
pub mod finalize;
pub mod gatekeeper;
pub mod language;
pub mod request;
pub mod session;

pub use access::Decision;
pub use classify::{RouteClass, classify};
pub use gatekeeper::gate_request;
pub use language::{LocaleRouter, LocaleRouting, PrefixLocaleRouter};
pub use request::RequestContext;
