//! Services the gate depends on.

pub mod token;

pub use token::{JwtTokenVerifier, TokenVerifier};
