//! HTTP route handlers served by the gate process itself.

pub mod health;
pub mod metrics;
pub mod seo;
pub mod upstream;
