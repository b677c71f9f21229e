//! `freightdesk-auth` — authentication boundary (token claims + validation).
//!
//! Token issuance and user administration live outside this system; this
//! crate only verifies what arrives and exposes the resolved identity.

pub mod actor;
pub mod claims;
pub mod jwt;
pub mod roles;

pub use actor::Actor;
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use roles::Role;
