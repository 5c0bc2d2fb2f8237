//! Failure taxonomy of the access-control engine.

use std::fmt;
use std::time::Duration;

use crate::grant::Subject;
use crate::rank::Rank;
use crate::resource::ResourceRef;
use crate::types::DbId;

/// What a failed check was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckTarget {
    Resource(ResourceRef),
    AccessRight(DbId),
}

impl fmt::Display for CheckTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckTarget::Resource(resource) => write!(f, "{resource}"),
            CheckTarget::AccessRight(id) => write!(f, "access right {id}"),
        }
    }
}

/// Failure of the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store operation exceeded its {0:?} deadline")]
    Timeout(Duration),

    #[error("Store backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Store integrity violation: {0}")]
    Integrity(String),
}

impl StoreError {
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        StoreError::Backend(err.into())
    }
}

/// Typed outcome of a failed check or grant mutation.
///
/// Every variant denies access; nothing here is ever treated as success.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("No access right for user {subject} on {target}")]
    RightNotFound { subject: DbId, target: CheckTarget },

    #[error("Access right rank '{held}' is below required rank '{required}'")]
    InsufficientRank { held: Rank, required: Rank },

    #[error("Invalid resource reference: {0}")]
    InvalidReference(String),

    #[error("{subject} already holds an access right on {resource}")]
    RightExists {
        subject: Subject,
        resource: ResourceRef,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
