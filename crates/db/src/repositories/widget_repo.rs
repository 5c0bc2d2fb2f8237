//! Repository for the `widgets` table.

use nsi_core::types::DbId;
use nsi_core::widget::{NewWidget, WidgetUpdate};
use sqlx::{PgExecutor, PgPool};

use crate::models::widget::{WidgetRankRow, WidgetRow};

/// Column list for `widgets` queries.
const COLUMNS: &str = "id, name, dashboard_id, widget_type, config";

pub struct WidgetRepo;

impl WidgetRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<WidgetRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM widgets WHERE id = $1");
        sqlx::query_as::<_, WidgetRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_dashboard_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT dashboard_id FROM widgets WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Every widget of a dashboard with the user's direct rank on each.
    pub async fn list_with_rank(
        pool: &PgPool,
        user_id: DbId,
        dashboard_id: DbId,
    ) -> Result<Vec<WidgetRankRow>, sqlx::Error> {
        sqlx::query_as::<_, WidgetRankRow>(
            "SELECT w.id, w.name, w.dashboard_id, w.widget_type, w.config, \
                 (SELECT ar.rank FROM access_rights ar \
                  JOIN widget_access_rights war ON war.access_right_id = ar.id \
                  WHERE war.widget_id = w.id AND ar.user_id = $1 \
                  ORDER BY ar.id LIMIT 1) AS rank \
             FROM widgets w \
             WHERE w.dashboard_id = $2 \
             ORDER BY w.id",
        )
        .bind(user_id)
        .bind(dashboard_id)
        .fetch_all(pool)
        .await
    }

    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &NewWidget,
    ) -> Result<WidgetRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO widgets (name, dashboard_id, widget_type, config) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WidgetRow>(&query)
            .bind(&input.name)
            .bind(input.dashboard_id)
            .bind(input.widget_type.as_str())
            .bind(&input.config)
            .fetch_one(&mut **tx)
            .await
    }

    /// Apply a partial update. Only non-`None` fields are changed.
    pub async fn update(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        input: &WidgetUpdate,
    ) -> Result<Option<WidgetRow>, sqlx::Error> {
        let query = format!(
            "UPDATE widgets SET \
                name = COALESCE($2, name), \
                config = COALESCE($3, config), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WidgetRow>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.config)
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn delete(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM widgets WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
