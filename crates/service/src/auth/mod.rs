//! Credentials and bearer tokens.
//!
//! `token` signs and checks HS256 JWTs carrying subject + role, `password`
//! wraps argon2 for the stored digest.

pub mod errors;
pub mod password;
pub mod token;

pub use errors::{AccessError, TokenError};
pub use token::{Claims, TokenService};
