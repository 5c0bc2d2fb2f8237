//! Grants (access rights) and the subjects they apply to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::rank::Rank;
use crate::types::DbId;

/// The user or user group a grant applies to. Never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    User(DbId),
    UserGroup(DbId),
}

impl Subject {
    /// Build a subject from the two nullable storage columns.
    pub fn from_columns(
        user_id: Option<DbId>,
        user_group_id: Option<DbId>,
    ) -> Result<Self, CoreError> {
        match (user_id, user_group_id) {
            (Some(id), None) => Ok(Subject::User(id)),
            (None, Some(id)) => Ok(Subject::UserGroup(id)),
            (None, None) => Err(CoreError::Validation(
                "access right has neither user_id nor user_group_id".into(),
            )),
            (Some(_), Some(_)) => Err(CoreError::Validation(
                "access right has both user_id and user_group_id".into(),
            )),
        }
    }

    pub const fn user_id(self) -> Option<DbId> {
        match self {
            Subject::User(id) => Some(id),
            Subject::UserGroup(_) => None,
        }
    }

    pub const fn user_group_id(self) -> Option<DbId> {
        match self {
            Subject::UserGroup(id) => Some(id),
            Subject::User(_) => None,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::User(id) => write!(f, "user {id}"),
            Subject::UserGroup(id) => write!(f, "user group {id}"),
        }
    }
}

/// A (subject, rank) pair bound to exactly one resource through an
/// association row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grant {
    pub id: DbId,
    pub subject: Subject,
    /// Reserved; not consulted during resolution.
    pub access_token: Option<String>,
    pub rank: Rank,
}

/// A freshly issued access right and the association row that binds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GrantBinding {
    pub association_id: DbId,
    pub access_right_id: DbId,
}

/// Input for creating an access right row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGrant {
    pub subject: Subject,
    pub rank: Rank,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_requires_exactly_one_column() {
        assert_eq!(Subject::from_columns(Some(1), None).unwrap(), Subject::User(1));
        assert_eq!(
            Subject::from_columns(None, Some(9)).unwrap(),
            Subject::UserGroup(9)
        );
        assert!(Subject::from_columns(None, None).is_err());
        assert!(Subject::from_columns(Some(1), Some(9)).is_err());
    }

    #[test]
    fn subject_column_projection() {
        assert_eq!(Subject::User(3).user_id(), Some(3));
        assert_eq!(Subject::User(3).user_group_id(), None);
        assert_eq!(Subject::UserGroup(4).user_group_id(), Some(4));
    }
}
