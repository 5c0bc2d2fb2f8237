//! In-process event bus backed by a `tokio::sync::broadcast` channel.

use nsi_core::notify::{ChangeNotifier, ChangeRecord};
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out hub for [`ChangeRecord`]s, shared as `Arc<EventBus>`.
pub struct EventBus {
    sender: broadcast::Sender<ChangeRecord>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unread records are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a record to all current subscribers.
    ///
    /// With no subscribers the record is dropped.
    pub fn publish(&self, record: ChangeRecord) {
        if self.sender.send(record).is_err() {
            tracing::debug!("Change record dropped, no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeRecord> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeNotifier for EventBus {
    fn notify(&self, record: ChangeRecord) {
        self.publish(record);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use nsi_core::notify::WIDGET_CREATED;
    use nsi_core::resource::ResourceRef;

    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            ChangeRecord::new(WIDGET_CREATED, ResourceRef::Widget(42), 7)
                .with_payload(serde_json::json!({"dashboard_id": 3})),
        );

        let received = rx.recv().await.expect("should receive the record");
        assert_eq!(received.event_type, "widget.created");
        assert_eq!(received.resource, ResourceRef::Widget(42));
        assert_eq!(received.actor_user_id, 7);
        assert_eq!(received.payload["dashboard_id"], 3);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_record() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(ChangeRecord::new("dashboard.created", ResourceRef::Dashboard(1), 1));

        assert_eq!(rx1.recv().await.unwrap().event_type, "dashboard.created");
        assert_eq!(rx2.recv().await.unwrap().event_type, "dashboard.created");
    }

    #[tokio::test]
    async fn works_as_change_notifier() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let notifier: Arc<dyn ChangeNotifier> = bus.clone();

        notifier.notify(ChangeRecord::new("widget.deleted", ResourceRef::Widget(5), 2));

        assert_eq!(rx.recv().await.unwrap().resource, ResourceRef::Widget(5));
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(ChangeRecord::new("orphan.event", ResourceRef::Dashboard(1), 1));
    }

    #[tokio::test]
    async fn slow_subscriber_observes_lag() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for id in 0..4 {
            bus.publish(ChangeRecord::new("widget.updated", ResourceRef::Widget(id), 1));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
    }
}
