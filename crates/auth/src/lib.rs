//! `loyalty-auth` — pure authentication boundary (zero-trust).
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod actor;
pub mod claims;
pub mod validator;

pub use actor::Actor;
pub use claims::{AuthClaims, TokenValidationError, validate_claims};
pub use validator::{Hs256JwtValidator, JwtValidator};
