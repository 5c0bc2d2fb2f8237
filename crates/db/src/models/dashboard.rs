//! Row shapes for the `dashboards` table.

use nsi_core::dashboard::{Dashboard, DashboardAccess};
use nsi_core::error::CoreError;
use nsi_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `dashboards` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DashboardRow {
    pub id: DbId,
    pub name: String,
    pub parent_id: Option<DbId>,
}

impl From<DashboardRow> for Dashboard {
    fn from(row: DashboardRow) -> Self {
        Dashboard {
            id: row.id,
            name: row.name,
            parent_id: row.parent_id,
        }
    }
}

/// A dashboard joined with one user's direct access right rank.
#[derive(Debug, Clone, FromRow)]
pub struct DashboardRankRow {
    pub id: DbId,
    pub name: String,
    pub parent_id: Option<DbId>,
    pub rank: String,
}

impl TryFrom<DashboardRankRow> for DashboardAccess {
    type Error = CoreError;

    fn try_from(row: DashboardRankRow) -> Result<Self, Self::Error> {
        Ok(DashboardAccess {
            rank: row.rank.parse()?,
            dashboard: Dashboard {
                id: row.id,
                name: row.name,
                parent_id: row.parent_id,
            },
        })
    }
}
