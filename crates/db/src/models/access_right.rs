//! Row shapes for `access_rights` and its association tables.

use nsi_core::error::CoreError;
use nsi_core::grant::{Grant, Subject};
use nsi_core::types::DbId;
use sqlx::FromRow;

/// A row from the `access_rights` table.
#[derive(Debug, Clone, FromRow)]
pub struct AccessRightRow {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub user_group_id: Option<DbId>,
    pub access_token: Option<String>,
    pub rank: String,
}

impl TryFrom<AccessRightRow> for Grant {
    type Error = CoreError;

    fn try_from(row: AccessRightRow) -> Result<Self, Self::Error> {
        Ok(Grant {
            id: row.id,
            subject: Subject::from_columns(row.user_id, row.user_group_id)?,
            access_token: row.access_token,
            rank: row.rank.parse()?,
        })
    }
}

/// Where an access right is bound. At most one column is set.
#[derive(Debug, Clone, FromRow)]
pub struct AccessRightOwnerRow {
    pub dashboard_id: Option<DbId>,
    pub widget_id: Option<DbId>,
}
