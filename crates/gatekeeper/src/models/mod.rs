//! Domain types shared by the gate and the routes.

pub mod currency;
pub mod locale;
pub mod role;
pub mod session;

pub use currency::Currency;
pub use locale::Locale;
pub use role::{Capability, Role};
pub use session::{Session, SessionClaims};
