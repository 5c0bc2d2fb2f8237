//! Token-validation collaborator.
//!
//! The HTTP layer hands the bearer token to an [`IdentityProvider`] and
//! treats a valid response's `user_id` as ground truth for the rest of the
//! request. No further verification of the identity is performed.

use async_trait::async_trait;
use nsi_core::types::DbId;

use crate::auth::jwt::{validate_token, JwtConfig};

/// Outcome of validating a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenValidation {
    pub is_valid: bool,
    pub user_id: DbId,
}

impl TokenValidation {
    pub const INVALID: TokenValidation = TokenValidation {
        is_valid: false,
        user_id: 0,
    };
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn validate(&self, token: &str) -> Result<TokenValidation, IdentityError>;
}

/// Validates locally issued HS256 access tokens.
pub struct JwtIdentity {
    config: JwtConfig,
}

impl JwtIdentity {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentity {
    async fn validate(&self, token: &str) -> Result<TokenValidation, IdentityError> {
        match validate_token(token, &self.config) {
            Ok(claims) => Ok(TokenValidation {
                is_valid: true,
                user_id: claims.sub,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected access token");
                Ok(TokenValidation::INVALID)
            }
        }
    }
}
