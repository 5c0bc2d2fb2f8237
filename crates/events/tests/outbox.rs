use nsi_core::notify::ChangeRecord;
use nsi_core::resource::ResourceRef;
use nsi_db::repositories::EventRepo;
use nsi_events::{EventBus, EventOutbox};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_outbox_stores_published_records(pool: PgPool) {
    let bus = EventBus::default();
    let handle = tokio::spawn(EventOutbox::run(pool.clone(), bus.subscribe()));

    bus.publish(
        ChangeRecord::new("widget.created", ResourceRef::Widget(42), 1)
            .with_payload(serde_json::json!({"name": "Chart"})),
    );
    drop(bus);
    handle.await.unwrap();

    let events = EventRepo::list_recent(&pool, 10, 0).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "widget.created");
    assert_eq!(events[0].resource_kind, "widget");
    assert_eq!(events[0].resource_id, 42);
    assert_eq!(events[0].payload["name"], "Chart");
}
