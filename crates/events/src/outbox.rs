//! Durable change-event outbox.
//!
//! [`EventOutbox`] subscribes to the [`EventBus`](crate::bus::EventBus) and
//! writes every received [`ChangeRecord`] to `change_events`. Failures are
//! logged and never reach the request that produced the record.

use nsi_core::notify::ChangeRecord;
use nsi_db::repositories::EventRepo;
use nsi_db::DbPool;
use tokio::sync::broadcast;

pub struct EventOutbox;

impl EventOutbox {
    /// Run the outbox loop until the bus is dropped.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<ChangeRecord>) {
        loop {
            match receiver.recv().await {
                Ok(record) => match EventRepo::insert(&pool, &record).await {
                    Ok(id) => tracing::debug!(
                        event_id = id,
                        event_type = %record.event_type,
                        resource = %record.resource,
                        "Change event stored"
                    ),
                    Err(e) => tracing::error!(
                        error = %e,
                        event_type = %record.event_type,
                        resource = %record.resource,
                        "Failed to store change event"
                    ),
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Change outbox lagged, some events were not stored");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, change outbox shutting down");
                    break;
                }
            }
        }
    }
}
