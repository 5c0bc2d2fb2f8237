//! Change notifications emitted after committed resource mutations.
//!
//! Publishing is fire-and-forget: a notifier never fails the operation that
//! triggered it, and records are only handed over once the unit of work has
//! committed.

use serde::Serialize;

use crate::resource::ResourceRef;
use crate::types::{DbId, Timestamp};

pub const DASHBOARD_CREATED: &str = "dashboard.created";
pub const DASHBOARD_DELETED: &str = "dashboard.deleted";
pub const WIDGET_CREATED: &str = "widget.created";
pub const WIDGET_UPDATED: &str = "widget.updated";
pub const WIDGET_DELETED: &str = "widget.deleted";

/// A committed change to a dashboard or widget.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeRecord {
    pub event_type: String,
    pub resource: ResourceRef,
    pub actor_user_id: DbId,
    pub payload: serde_json::Value,
    pub timestamp: Timestamp,
}

impl ChangeRecord {
    pub fn new(event_type: impl Into<String>, resource: ResourceRef, actor_user_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            resource,
            actor_user_id,
            payload: serde_json::Value::Null,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Sink for change records.
pub trait ChangeNotifier: Send + Sync {
    fn notify(&self, record: ChangeRecord);
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn notify(&self, _record: ChangeRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_resource_tag() {
        let record = ChangeRecord::new(WIDGET_CREATED, ResourceRef::Widget(42), 7)
            .with_payload(serde_json::json!({"name": "Chart"}));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["event_type"], "widget.created");
        assert_eq!(json["resource"]["kind"], "widget");
        assert_eq!(json["resource"]["id"], 42);
        assert_eq!(json["payload"]["name"], "Chart");
    }
}
