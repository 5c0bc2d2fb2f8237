use std::sync::Arc;

use crate::access::{AccessStore, RightsMutator, RightsResolver};
use crate::dashboard::{validate_name, Dashboard, DashboardAccess, NewDashboard};
use crate::error::CoreError;
use crate::notify::{self, ChangeNotifier, ChangeRecord};
use crate::rank::Rank;
use crate::resource::ResourceRef;
use crate::types::DbId;

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn AccessStore>,
    resolver: RightsResolver,
    mutator: RightsMutator,
    notifier: Arc<dyn ChangeNotifier>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn AccessStore>, notifier: Arc<dyn ChangeNotifier>) -> Self {
        let mutator = RightsMutator::new(Arc::clone(&store));
        Self {
            resolver: mutator.resolver().clone(),
            store,
            mutator,
            notifier,
        }
    }

    /// Create a dashboard owned by `owner`.
    ///
    /// Nesting under a parent requires Update on the parent. The dashboard
    /// row and the owner's Admin grant commit together.
    pub async fn create(&self, owner: DbId, input: NewDashboard) -> Result<Dashboard, CoreError> {
        validate_name(&input.name)?;
        if let Some(parent_id) = input.parent_id {
            self.resolver
                .check_dashboard_right(owner, parent_id, Rank::Update)
                .await?;
        }

        let input = NewDashboard {
            name: input.name.trim().to_string(),
            ..input
        };

        let mut uow = self.store.begin().await?;
        let dashboard = uow.insert_dashboard(&input).await?;
        self.mutator
            .seed_owner(uow.as_mut(), ResourceRef::Dashboard(dashboard.id), owner)
            .await?;
        uow.commit().await?;

        tracing::info!(dashboard_id = dashboard.id, owner, "Dashboard created");
        self.notifier.notify(
            ChangeRecord::new(
                notify::DASHBOARD_CREATED,
                ResourceRef::Dashboard(dashboard.id),
                owner,
            )
            .with_payload(serde_json::json!({
                "name": dashboard.name,
                "parent_id": dashboard.parent_id,
            })),
        );
        Ok(dashboard)
    }

    pub async fn get(&self, requester: DbId, id: DbId) -> Result<Dashboard, CoreError> {
        self.resolver
            .check_dashboard_right(requester, id, Rank::ReadOnly)
            .await?;
        self.store.dashboard(id).await?.ok_or(CoreError::NotFound {
            entity: "Dashboard",
            id,
        })
    }

    /// Dashboards `user_id` holds a direct grant on, with that grant's rank.
    pub async fn list_for(&self, user_id: DbId) -> Result<Vec<DashboardAccess>, CoreError> {
        Ok(self.store.dashboards_for_user(user_id).await?)
    }

    /// Delete a dashboard with its widgets and every grant bound to them.
    ///
    /// Child dashboards survive and become top-level.
    pub async fn delete(&self, requester: DbId, id: DbId) -> Result<(), CoreError> {
        self.resolver
            .check_dashboard_right(requester, id, Rank::Admin)
            .await?;

        let mut uow = self.store.begin().await?;
        if !uow.delete_dashboard(id).await? {
            return Err(CoreError::NotFound {
                entity: "Dashboard",
                id,
            });
        }
        uow.commit().await?;

        tracing::info!(dashboard_id = id, requester, "Dashboard deleted");
        self.notifier.notify(ChangeRecord::new(
            notify::DASHBOARD_DELETED,
            ResourceRef::Dashboard(id),
            requester,
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::access::AccessError;
    use crate::grant::Subject;
    use crate::testing::{InMemoryStore, RecordingNotifier};

    fn service(store: &InMemoryStore) -> (DashboardService, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let service = DashboardService::new(Arc::new(store.clone()), notifier.clone());
        (service, notifier)
    }

    fn new_dashboard(name: &str, parent_id: Option<DbId>) -> NewDashboard {
        NewDashboard {
            name: name.into(),
            parent_id,
        }
    }

    #[tokio::test]
    async fn creator_becomes_admin() {
        let store = InMemoryStore::new();
        let (service, notifier) = service(&store);

        let dashboard = service
            .create(1, new_dashboard("  Sales  ", None))
            .await
            .unwrap();
        assert_eq!(dashboard.name, "Sales");

        let listed = service.list_for(1).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].rank, Rank::Admin);
        assert_eq!(notifier.event_types(), vec![notify::DASHBOARD_CREATED]);
    }

    #[tokio::test]
    async fn blank_name_rejected_before_any_write() {
        let store = InMemoryStore::new();
        let (service, notifier) = service(&store);

        assert_matches!(
            service.create(1, new_dashboard("   ", None)).await,
            Err(CoreError::Validation(_))
        );
        assert_eq!(store.dashboard_count().await, 0);
        assert!(notifier.event_types().is_empty());
    }

    #[tokio::test]
    async fn failed_owner_grant_rolls_back_dashboard() {
        let store = InMemoryStore::new();
        let (service, notifier) = service(&store);
        store.fail_grant_writes(true);

        assert!(service.create(1, new_dashboard("Sales", None)).await.is_err());
        assert_eq!(store.dashboard_count().await, 0);
        assert_eq!(store.grant_count().await, 0);
        assert!(notifier.event_types().is_empty());
    }

    #[tokio::test]
    async fn nesting_requires_update_on_parent() {
        let store = InMemoryStore::new();
        let parent = store.seed_dashboard("Parent", None).await;
        store
            .seed_grant(ResourceRef::Dashboard(parent), Subject::User(2), Rank::ReadOnly)
            .await;
        store
            .seed_grant(ResourceRef::Dashboard(parent), Subject::User(3), Rank::Update)
            .await;
        let (service, _) = service(&store);

        assert_matches!(
            service.create(2, new_dashboard("Child", Some(parent))).await,
            Err(CoreError::Access(AccessError::InsufficientRank { .. }))
        );
        let child = service
            .create(3, new_dashboard("Child", Some(parent)))
            .await
            .unwrap();
        assert_eq!(child.parent_id, Some(parent));
    }

    #[tokio::test]
    async fn get_requires_read() {
        let store = InMemoryStore::new();
        let (service, _) = service(&store);
        let dashboard = service.create(1, new_dashboard("Sales", None)).await.unwrap();

        assert_eq!(service.get(1, dashboard.id).await.unwrap(), dashboard);
        assert_matches!(
            service.get(2, dashboard.id).await,
            Err(CoreError::Access(AccessError::RightNotFound { .. }))
        );
    }

    #[tokio::test]
    async fn delete_requires_admin_and_cascades() {
        let store = InMemoryStore::new();
        let (service, notifier) = service(&store);
        let dashboard = service.create(1, new_dashboard("Sales", None)).await.unwrap();
        store.seed_widget("Chart", dashboard.id).await;
        store
            .seed_grant(ResourceRef::Dashboard(dashboard.id), Subject::User(2), Rank::Update)
            .await;

        assert_matches!(
            service.delete(2, dashboard.id).await,
            Err(CoreError::Access(AccessError::InsufficientRank { .. }))
        );

        service.delete(1, dashboard.id).await.unwrap();
        assert_eq!(store.dashboard_count().await, 0);
        assert_eq!(store.widget_count().await, 0);
        assert_eq!(store.grant_count().await, 0);
        assert_eq!(
            notifier.event_types(),
            vec![notify::DASHBOARD_CREATED, notify::DASHBOARD_DELETED]
        );
    }
}
