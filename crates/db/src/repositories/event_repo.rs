//! Repository for the `change_events` outbox table.

use nsi_core::notify::ChangeRecord;
use nsi_core::types::DbId;
use sqlx::PgPool;

use crate::models::event::ChangeEventRow;

/// Column list for `change_events` queries.
const COLUMNS: &str =
    "id, event_type, resource_kind, resource_id, actor_user_id, payload, occurred_at, created_at";

pub struct EventRepo;

impl EventRepo {
    /// Insert a change record, returning the generated ID.
    pub async fn insert(pool: &PgPool, record: &ChangeRecord) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO change_events \
                (event_type, resource_kind, resource_id, actor_user_id, payload, occurred_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(&record.event_type)
        .bind(record.resource.kind().as_str())
        .bind(record.resource.id())
        .bind(record.actor_user_id)
        .bind(&record.payload)
        .bind(record.timestamp)
        .fetch_one(pool)
        .await
    }

    /// List recent change events ordered newest-first.
    pub async fn list_recent(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChangeEventRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM change_events ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, ChangeEventRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
