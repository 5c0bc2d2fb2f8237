//! Authentication primitives.
//!
//! - [`jwt`]: HS256 access-token generation and validation.
//! - [`identity`]: the token-validation collaborator the HTTP layer trusts.

pub mod identity;
pub mod jwt;
