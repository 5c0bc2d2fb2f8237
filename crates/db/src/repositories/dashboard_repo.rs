//! Repository for the `dashboards` table.

use nsi_core::types::DbId;
use sqlx::PgPool;

use crate::models::dashboard::{DashboardRankRow, DashboardRow};

/// Column list for `dashboards` queries.
const COLUMNS: &str = "id, name, parent_id";

pub struct DashboardRepo;

impl DashboardRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DashboardRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dashboards WHERE id = $1");
        sqlx::query_as::<_, DashboardRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Dashboards the user holds a direct access right on, with its rank.
    ///
    /// When a user holds several rights on one dashboard the lowest id wins,
    /// matching how checks pick a direct grant.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<DashboardRankRow>, sqlx::Error> {
        sqlx::query_as::<_, DashboardRankRow>(
            "SELECT d.id, d.name, d.parent_id, r.rank \
             FROM dashboards d \
             JOIN LATERAL ( \
                 SELECT ar.rank FROM access_rights ar \
                 JOIN dashboard_access_rights dar ON dar.access_right_id = ar.id \
                 WHERE dar.dashboard_id = d.id AND ar.user_id = $1 \
                 ORDER BY ar.id LIMIT 1 \
             ) r ON TRUE \
             ORDER BY d.id",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        name: &str,
        parent_id: Option<DbId>,
    ) -> Result<DashboardRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO dashboards (name, parent_id) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DashboardRow>(&query)
            .bind(name)
            .bind(parent_id)
            .fetch_one(&mut **tx)
            .await
    }

    /// Delete a dashboard. Widgets and association rows cascade; children
    /// are detached by the `parent_id` foreign key.
    pub async fn delete(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM dashboards WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
