//! Bearer token validation.
//!
//! Tokens are issued by the identity provider; this service only verifies
//! them and maps the subject to a profile.

pub mod jwt;
