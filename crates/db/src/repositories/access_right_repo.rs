//! Repository for `access_rights` and the `dashboard_access_rights` /
//! `widget_access_rights` association tables.
//!
//! Every query that takes a [`ResourceRef`] touches only the association
//! table matching the reference's kind.

use nsi_core::grant::Subject;
use nsi_core::rank::Rank;
use nsi_core::resource::{ResourceKind, ResourceRef};
use nsi_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::access_right::{AccessRightOwnerRow, AccessRightRow};

/// Column list for `access_rights` queries, aliased as `ar`.
const COLUMNS: &str = "ar.id, ar.user_id, ar.user_group_id, ar.access_token, ar.rank";

/// Association table and resource column for a resource kind.
fn association(kind: ResourceKind) -> (&'static str, &'static str) {
    match kind {
        ResourceKind::Dashboard => ("dashboard_access_rights", "dashboard_id"),
        ResourceKind::Widget => ("widget_access_rights", "widget_id"),
    }
}

pub struct AccessRightRepo;

impl AccessRightRepo {
    /// The user's access right bound directly to `resource`, lowest id first.
    pub async fn find_direct<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        resource: ResourceRef,
    ) -> Result<Option<AccessRightRow>, sqlx::Error> {
        let (table, column) = association(resource.kind());
        let query = format!(
            "SELECT {COLUMNS} FROM access_rights ar \
             JOIN {table} link ON link.access_right_id = ar.id \
             WHERE link.{column} = $1 AND ar.user_id = $2 \
             ORDER BY ar.id LIMIT 1"
        );
        sqlx::query_as::<_, AccessRightRow>(&query)
            .bind(resource.id())
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// The user's Admin access right on a dashboard, if any.
    pub async fn find_dashboard_admin<'e>(
        executor: impl PgExecutor<'e>,
        user_id: DbId,
        dashboard_id: DbId,
    ) -> Result<Option<AccessRightRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM access_rights ar \
             JOIN dashboard_access_rights dar ON dar.access_right_id = ar.id \
             WHERE dar.dashboard_id = $1 AND ar.user_id = $2 AND ar.rank = $3 \
             ORDER BY ar.id LIMIT 1"
        );
        sqlx::query_as::<_, AccessRightRow>(&query)
            .bind(dashboard_id)
            .bind(user_id)
            .bind(Rank::Admin.as_str())
            .fetch_optional(executor)
            .await
    }

    /// An access right by id, only if it belongs to `user_id`.
    pub async fn find_for_user(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<AccessRightRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM access_rights ar WHERE ar.id = $1 AND ar.user_id = $2");
        sqlx::query_as::<_, AccessRightRow>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Where an access right is bound; both columns are `NULL` when unbound.
    pub async fn find_owner<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<AccessRightOwnerRow, sqlx::Error> {
        sqlx::query_as::<_, AccessRightOwnerRow>(
            "SELECT \
                 (SELECT dashboard_id FROM dashboard_access_rights WHERE access_right_id = $1) AS dashboard_id, \
                 (SELECT widget_id FROM widget_access_rights WHERE access_right_id = $1) AS widget_id",
        )
        .bind(id)
        .fetch_one(executor)
        .await
    }

    pub async fn list_for_resource(
        pool: &PgPool,
        resource: ResourceRef,
    ) -> Result<Vec<AccessRightRow>, sqlx::Error> {
        let (table, column) = association(resource.kind());
        let query = format!(
            "SELECT {COLUMNS} FROM access_rights ar \
             JOIN {table} link ON link.access_right_id = ar.id \
             WHERE link.{column} = $1 \
             ORDER BY ar.id"
        );
        sqlx::query_as::<_, AccessRightRow>(&query)
            .bind(resource.id())
            .fetch_all(pool)
            .await
    }

    /// Lock `resource`'s row with `FOR NO KEY UPDATE` until the transaction
    /// ends. Grant mutations on the same resource queue behind each other;
    /// plain reads and association inserts are not blocked.
    pub async fn lock_resource(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        resource: ResourceRef,
    ) -> Result<(), sqlx::Error> {
        let table = match resource.kind() {
            ResourceKind::Dashboard => "dashboards",
            ResourceKind::Widget => "widgets",
        };
        let query = format!("SELECT id FROM {table} WHERE id = $1 FOR NO KEY UPDATE");
        sqlx::query(&query)
            .bind(resource.id())
            .fetch_optional(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        subject: Subject,
        rank: Rank,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO access_rights (user_id, user_group_id, rank) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(subject.user_id())
        .bind(subject.user_group_id())
        .bind(rank.as_str())
        .fetch_one(&mut **tx)
        .await
    }

    /// Insert the association row, returning its id.
    pub async fn bind(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        resource: ResourceRef,
    ) -> Result<DbId, sqlx::Error> {
        let (table, column) = association(resource.kind());
        let query =
            format!("INSERT INTO {table} ({column}, access_right_id) VALUES ($1, $2) RETURNING id");
        sqlx::query_scalar(&query)
            .bind(resource.id())
            .bind(id)
            .fetch_one(&mut **tx)
            .await
    }

    /// Delete the association between `id` and exactly `resource`.
    pub async fn unbind(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        resource: ResourceRef,
    ) -> Result<bool, sqlx::Error> {
        let (table, column) = association(resource.kind());
        let query = format!("DELETE FROM {table} WHERE access_right_id = $1 AND {column} = $2");
        let result = sqlx::query(&query)
            .bind(id)
            .bind(resource.id())
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM access_rights WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_rank(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        rank: Rank,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE access_rights SET rank = $2 WHERE id = $1")
            .bind(id)
            .bind(rank.as_str())
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every access right bound to a dashboard or to one of its
    /// widgets. Must run before the dashboard row itself is deleted.
    pub async fn delete_for_dashboard(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        dashboard_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM access_rights WHERE id IN ( \
                 SELECT access_right_id FROM dashboard_access_rights WHERE dashboard_id = $1 \
                 UNION \
                 SELECT war.access_right_id FROM widget_access_rights war \
                 JOIN widgets w ON w.id = war.widget_id \
                 WHERE w.dashboard_id = $1 \
             )",
        )
        .bind(dashboard_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete every access right bound to a widget.
    pub async fn delete_for_widget(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        widget_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM access_rights WHERE id IN ( \
                 SELECT access_right_id FROM widget_access_rights WHERE widget_id = $1 \
             )",
        )
        .bind(widget_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }
}
