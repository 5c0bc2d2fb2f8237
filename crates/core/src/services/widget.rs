use std::sync::Arc;

use crate::access::{prefer_direct, AccessStore, RightsMutator, RightsResolver};
use crate::dashboard::validate_name;
use crate::error::CoreError;
use crate::notify::{self, ChangeNotifier, ChangeRecord};
use crate::rank::Rank;
use crate::resource::ResourceRef;
use crate::types::DbId;
use crate::widget::{NewWidget, Widget, WidgetAccess, WidgetUpdate};

#[derive(Clone)]
pub struct WidgetService {
    store: Arc<dyn AccessStore>,
    resolver: RightsResolver,
    mutator: RightsMutator,
    notifier: Arc<dyn ChangeNotifier>,
}

impl WidgetService {
    pub fn new(store: Arc<dyn AccessStore>, notifier: Arc<dyn ChangeNotifier>) -> Self {
        let mutator = RightsMutator::new(Arc::clone(&store));
        Self {
            resolver: mutator.resolver().clone(),
            store,
            mutator,
            notifier,
        }
    }

    /// Create a widget on a dashboard the owner can update.
    pub async fn create(&self, owner: DbId, input: NewWidget) -> Result<Widget, CoreError> {
        validate_name(&input.name)?;
        self.resolver
            .check_dashboard_right(owner, input.dashboard_id, Rank::Update)
            .await?;

        let input = NewWidget {
            name: input.name.trim().to_string(),
            ..input
        };

        let mut uow = self.store.begin().await?;
        let widget = uow.insert_widget(&input).await?;
        self.mutator
            .seed_owner(uow.as_mut(), ResourceRef::Widget(widget.id), owner)
            .await?;
        uow.commit().await?;

        tracing::info!(widget_id = widget.id, dashboard_id = widget.dashboard_id, owner, "Widget created");
        self.publish(notify::WIDGET_CREATED, &widget, owner);
        Ok(widget)
    }

    pub async fn get(&self, requester: DbId, id: DbId) -> Result<WidgetAccess, CoreError> {
        let grant = self
            .resolver
            .check_widget_right(requester, id, Rank::ReadOnly)
            .await?;
        let widget = self.store.widget(id).await?.ok_or(CoreError::NotFound {
            entity: "Widget",
            id,
        })?;
        Ok(WidgetAccess {
            widget,
            rank: grant.rank,
        })
    }

    /// Widgets of a dashboard the requester can read, each with the
    /// requester's effective rank. Widgets they have no rank on are left out.
    pub async fn list_in_dashboard(
        &self,
        requester: DbId,
        dashboard_id: DbId,
    ) -> Result<Vec<WidgetAccess>, CoreError> {
        self.resolver
            .check_dashboard_right(requester, dashboard_id, Rank::ReadOnly)
            .await?;

        let inherited = self
            .store
            .inherited_admin_grant(requester, dashboard_id)
            .await?
            .map(|grant| grant.rank)
            .filter(|rank| *rank == Rank::Admin);
        let rows = self
            .store
            .widgets_in_dashboard(requester, dashboard_id)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(widget, direct)| {
                prefer_direct(direct, inherited).map(|rank| WidgetAccess { widget, rank })
            })
            .collect())
    }

    pub async fn update(
        &self,
        requester: DbId,
        id: DbId,
        update: WidgetUpdate,
    ) -> Result<Widget, CoreError> {
        if update.is_empty() {
            return Err(CoreError::Validation("No fields to update".into()));
        }
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        self.resolver
            .check_widget_right(requester, id, Rank::Update)
            .await?;

        let update = WidgetUpdate {
            name: update.name.map(|name| name.trim().to_string()),
            ..update
        };

        let mut uow = self.store.begin().await?;
        let widget = uow
            .update_widget(id, &update)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Widget",
                id,
            })?;
        uow.commit().await?;

        tracing::info!(widget_id = id, requester, "Widget updated");
        self.publish(notify::WIDGET_UPDATED, &widget, requester);
        Ok(widget)
    }

    pub async fn delete(&self, requester: DbId, id: DbId) -> Result<(), CoreError> {
        self.resolver
            .check_widget_right(requester, id, Rank::Admin)
            .await?;
        let widget = self.store.widget(id).await?.ok_or(CoreError::NotFound {
            entity: "Widget",
            id,
        })?;

        let mut uow = self.store.begin().await?;
        if !uow.delete_widget(id).await? {
            return Err(CoreError::NotFound {
                entity: "Widget",
                id,
            });
        }
        uow.commit().await?;

        tracing::info!(widget_id = id, requester, "Widget deleted");
        self.publish(notify::WIDGET_DELETED, &widget, requester);
        Ok(())
    }

    fn publish(&self, event_type: &str, widget: &Widget, actor: DbId) {
        self.notifier.notify(
            ChangeRecord::new(event_type, ResourceRef::Widget(widget.id), actor).with_payload(
                serde_json::json!({
                    "dashboard_id": widget.dashboard_id,
                    "name": widget.name,
                    "widget_type": widget.widget_type,
                }),
            ),
        );
    }
}
