//! Authentication primitives.
//!
//! - [`password`] -- Argon2id hashing and verification.
//! - [`jwt`] -- HS256 access tokens keyed by username.
//! - [`extract`] -- axum extractors for bearer tokens.

pub mod extract;
pub mod jwt;
pub mod password;
