//! Request extractors.
//!
//! - [`auth::AuthUser`] -- resolves the acting user from a JWT Bearer token.

pub mod auth;
