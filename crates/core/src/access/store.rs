//! Persistence contract consumed by the resolver, the mutator and the
//! resource services.
//!
//! Reads go straight to the store; every write goes through a
//! [`UnitOfWork`], which is one transaction. A unit of work that is dropped
//! without [`UnitOfWork::commit`] leaves no trace.
//!
//! Grant mutations lock the target resource first and repeat their
//! authorization and duplicate reads through the same unit of work, so two
//! mutations on one resource never decide from the same snapshot.

use async_trait::async_trait;

use super::error::StoreError;
use crate::dashboard::{Dashboard, DashboardAccess, NewDashboard};
use crate::grant::{Grant, NewGrant};
use crate::rank::Rank;
use crate::resource::ResourceRef;
use crate::types::DbId;
use crate::widget::{NewWidget, Widget, WidgetUpdate};

/// Grant lookups used during resolution and inspection.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// The grant bound directly to `resource` for user `subject_id`.
    ///
    /// When several exist the one with the lowest id is returned.
    async fn direct_grant(
        &self,
        subject_id: DbId,
        resource: ResourceRef,
    ) -> Result<Option<Grant>, StoreError>;

    /// An Admin-rank grant bound to `parent_dashboard_id` for `subject_id`.
    async fn inherited_admin_grant(
        &self,
        subject_id: DbId,
        parent_dashboard_id: DbId,
    ) -> Result<Option<Grant>, StoreError>;

    /// The dashboard owning `widget_id`, if the widget exists.
    async fn widget_dashboard(&self, widget_id: DbId) -> Result<Option<DbId>, StoreError>;

    /// The access right `access_right_id` if it belongs to user `subject_id`.
    async fn grant_by_id(
        &self,
        subject_id: DbId,
        access_right_id: DbId,
    ) -> Result<Option<Grant>, StoreError>;

    /// The resource an access right is bound to, if it is bound at all.
    async fn grant_owner(&self, access_right_id: DbId) -> Result<Option<ResourceRef>, StoreError>;

    /// Every grant bound to `resource`, ordered by id.
    async fn list_grants(&self, resource: ResourceRef) -> Result<Vec<Grant>, StoreError>;
}

/// Resource reads.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn dashboard(&self, id: DbId) -> Result<Option<Dashboard>, StoreError>;

    /// Dashboards on which `user_id` holds a direct grant, with that rank.
    async fn dashboards_for_user(&self, user_id: DbId) -> Result<Vec<DashboardAccess>, StoreError>;

    async fn widget(&self, id: DbId) -> Result<Option<Widget>, StoreError>;

    /// Every widget of `dashboard_id` with `user_id`'s direct rank on it.
    async fn widgets_in_dashboard(
        &self,
        user_id: DbId,
        dashboard_id: DbId,
    ) -> Result<Vec<(Widget, Option<Rank>)>, StoreError>;
}

/// One transaction's worth of writes.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Hold `resource`'s row lock until the unit of work ends. A missing
    /// resource locks nothing.
    async fn lock_resource(&mut self, resource: ResourceRef) -> Result<(), StoreError>;

    /// [`GrantStore::direct_grant`], seen from inside the transaction.
    async fn direct_grant(
        &mut self,
        subject_id: DbId,
        resource: ResourceRef,
    ) -> Result<Option<Grant>, StoreError>;

    /// [`GrantStore::inherited_admin_grant`], seen from inside the transaction.
    async fn inherited_admin_grant(
        &mut self,
        subject_id: DbId,
        parent_dashboard_id: DbId,
    ) -> Result<Option<Grant>, StoreError>;

    async fn widget_dashboard(&mut self, widget_id: DbId) -> Result<Option<DbId>, StoreError>;

    async fn grant_owner(&mut self, access_right_id: DbId) -> Result<Option<ResourceRef>, StoreError>;

    async fn insert_dashboard(&mut self, input: &NewDashboard) -> Result<Dashboard, StoreError>;

    async fn insert_widget(&mut self, input: &NewWidget) -> Result<Widget, StoreError>;

    /// Apply a patch; `None` if the widget does not exist.
    async fn update_widget(
        &mut self,
        id: DbId,
        update: &WidgetUpdate,
    ) -> Result<Option<Widget>, StoreError>;

    /// Delete a dashboard, its widgets and every grant bound to any of them.
    async fn delete_dashboard(&mut self, id: DbId) -> Result<bool, StoreError>;

    /// Delete a widget and every grant bound to it.
    async fn delete_widget(&mut self, id: DbId) -> Result<bool, StoreError>;

    /// Insert an access right row, returning its id.
    async fn create_grant(&mut self, grant: &NewGrant) -> Result<DbId, StoreError>;

    /// Bind an access right to a resource, returning the association id.
    ///
    /// Fails with [`StoreError::Integrity`] if the right's user already holds
    /// another right on `resource`.
    async fn bind_grant(
        &mut self,
        access_right_id: DbId,
        resource: ResourceRef,
    ) -> Result<DbId, StoreError>;

    /// Remove the association between `access_right_id` and `resource`.
    ///
    /// Only the association table matching `resource`'s kind is touched, and
    /// only the row for that exact resource id. Returns `false` if no such
    /// association existed.
    async fn unbind_grant(
        &mut self,
        access_right_id: DbId,
        resource: ResourceRef,
    ) -> Result<bool, StoreError>;

    async fn delete_grant(&mut self, access_right_id: DbId) -> Result<bool, StoreError>;

    async fn update_rank(&mut self, access_right_id: DbId, rank: Rank) -> Result<bool, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// The full store: reads plus transactional writes.
#[async_trait]
pub trait AccessStore: GrantStore + ResourceStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;

    /// Cheap reachability probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}
