//! Row shape for the `change_events` outbox table.

use nsi_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `change_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChangeEventRow {
    pub id: DbId,
    pub event_type: String,
    pub resource_kind: String,
    pub resource_id: DbId,
    pub actor_user_id: DbId,
    pub payload: serde_json::Value,
    pub occurred_at: Timestamp,
    pub created_at: Timestamp,
}
