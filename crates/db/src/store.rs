//! [`AccessStore`] backed by Postgres.
//!
//! Reads run on the pool; each [`UnitOfWork`] owns one transaction, which
//! sqlx rolls back if it is dropped before commit.

use async_trait::async_trait;
use nsi_core::access::{AccessStore, GrantStore, ResourceStore, StoreError, UnitOfWork};
use nsi_core::dashboard::{Dashboard, DashboardAccess, NewDashboard};
use nsi_core::error::CoreError;
use nsi_core::grant::{Grant, NewGrant};
use nsi_core::rank::Rank;
use nsi_core::resource::ResourceRef;
use nsi_core::types::DbId;
use nsi_core::widget::{NewWidget, Widget, WidgetUpdate};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::access_right::AccessRightOwnerRow;
use crate::repositories::{AccessRightRepo, DashboardRepo, WidgetRepo};

/// Map a sqlx error onto the store taxonomy.
///
/// Constraint violations (not-null 23502, foreign key 23503, unique 23505,
/// check 23514) become [`StoreError::Integrity`]; everything else is a
/// backend failure.
fn store_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if matches!(
            db_err.code().as_deref(),
            Some("23502" | "23503" | "23505" | "23514")
        ) {
            return StoreError::Integrity(db_err.message().to_string());
        }
    }
    StoreError::backend(err)
}

fn row_err(err: CoreError) -> StoreError {
    StoreError::Integrity(err.to_string())
}

fn owner_ref(access_right_id: DbId, owner: AccessRightOwnerRow) -> Result<Option<ResourceRef>, StoreError> {
    match (owner.dashboard_id, owner.widget_id) {
        (None, None) => Ok(None),
        (dashboard_id, widget_id) => ResourceRef::from_parts(dashboard_id, widget_id)
            .map(Some)
            .map_err(|_| {
                StoreError::Integrity(format!(
                    "access right {access_right_id} is bound to both a dashboard and a widget"
                ))
            }),
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl GrantStore for PgStore {
    async fn direct_grant(
        &self,
        subject_id: DbId,
        resource: ResourceRef,
    ) -> Result<Option<Grant>, StoreError> {
        AccessRightRepo::find_direct(&self.pool, subject_id, resource)
            .await
            .map_err(store_err)?
            .map(Grant::try_from)
            .transpose()
            .map_err(row_err)
    }

    async fn inherited_admin_grant(
        &self,
        subject_id: DbId,
        parent_dashboard_id: DbId,
    ) -> Result<Option<Grant>, StoreError> {
        AccessRightRepo::find_dashboard_admin(&self.pool, subject_id, parent_dashboard_id)
            .await
            .map_err(store_err)?
            .map(Grant::try_from)
            .transpose()
            .map_err(row_err)
    }

    async fn widget_dashboard(&self, widget_id: DbId) -> Result<Option<DbId>, StoreError> {
        WidgetRepo::find_dashboard_id(&self.pool, widget_id)
            .await
            .map_err(store_err)
    }

    async fn grant_by_id(
        &self,
        subject_id: DbId,
        access_right_id: DbId,
    ) -> Result<Option<Grant>, StoreError> {
        AccessRightRepo::find_for_user(&self.pool, subject_id, access_right_id)
            .await
            .map_err(store_err)?
            .map(Grant::try_from)
            .transpose()
            .map_err(row_err)
    }

    async fn grant_owner(&self, access_right_id: DbId) -> Result<Option<ResourceRef>, StoreError> {
        let owner = AccessRightRepo::find_owner(&self.pool, access_right_id)
            .await
            .map_err(store_err)?;
        owner_ref(access_right_id, owner)
    }

    async fn list_grants(&self, resource: ResourceRef) -> Result<Vec<Grant>, StoreError> {
        AccessRightRepo::list_for_resource(&self.pool, resource)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(Grant::try_from)
            .collect::<Result<_, _>>()
            .map_err(row_err)
    }
}

#[async_trait]
impl ResourceStore for PgStore {
    async fn dashboard(&self, id: DbId) -> Result<Option<Dashboard>, StoreError> {
        Ok(DashboardRepo::find_by_id(&self.pool, id)
            .await
            .map_err(store_err)?
            .map(Dashboard::from))
    }

    async fn dashboards_for_user(&self, user_id: DbId) -> Result<Vec<DashboardAccess>, StoreError> {
        DashboardRepo::list_for_user(&self.pool, user_id)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(DashboardAccess::try_from)
            .collect::<Result<_, _>>()
            .map_err(row_err)
    }

    async fn widget(&self, id: DbId) -> Result<Option<Widget>, StoreError> {
        WidgetRepo::find_by_id(&self.pool, id)
            .await
            .map_err(store_err)?
            .map(Widget::try_from)
            .transpose()
            .map_err(row_err)
    }

    async fn widgets_in_dashboard(
        &self,
        user_id: DbId,
        dashboard_id: DbId,
    ) -> Result<Vec<(Widget, Option<Rank>)>, StoreError> {
        WidgetRepo::list_with_rank(&self.pool, user_id, dashboard_id)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(|row| row.into_parts())
            .collect::<Result<_, _>>()
            .map_err(row_err)
    }
}

#[async_trait]
impl AccessStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let tx = self.pool.begin().await.map_err(store_err)?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await.map_err(store_err)
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_resource(&mut self, resource: ResourceRef) -> Result<(), StoreError> {
        AccessRightRepo::lock_resource(&mut self.tx, resource)
            .await
            .map_err(store_err)
    }

    async fn direct_grant(
        &mut self,
        subject_id: DbId,
        resource: ResourceRef,
    ) -> Result<Option<Grant>, StoreError> {
        AccessRightRepo::find_direct(&mut *self.tx, subject_id, resource)
            .await
            .map_err(store_err)?
            .map(Grant::try_from)
            .transpose()
            .map_err(row_err)
    }

    async fn inherited_admin_grant(
        &mut self,
        subject_id: DbId,
        parent_dashboard_id: DbId,
    ) -> Result<Option<Grant>, StoreError> {
        AccessRightRepo::find_dashboard_admin(&mut *self.tx, subject_id, parent_dashboard_id)
            .await
            .map_err(store_err)?
            .map(Grant::try_from)
            .transpose()
            .map_err(row_err)
    }

    async fn widget_dashboard(&mut self, widget_id: DbId) -> Result<Option<DbId>, StoreError> {
        WidgetRepo::find_dashboard_id(&mut *self.tx, widget_id)
            .await
            .map_err(store_err)
    }

    async fn grant_owner(&mut self, access_right_id: DbId) -> Result<Option<ResourceRef>, StoreError> {
        let owner = AccessRightRepo::find_owner(&mut *self.tx, access_right_id)
            .await
            .map_err(store_err)?;
        owner_ref(access_right_id, owner)
    }

    async fn insert_dashboard(&mut self, input: &NewDashboard) -> Result<Dashboard, StoreError> {
        DashboardRepo::insert(&mut self.tx, &input.name, input.parent_id)
            .await
            .map(Dashboard::from)
            .map_err(store_err)
    }

    async fn insert_widget(&mut self, input: &NewWidget) -> Result<Widget, StoreError> {
        let row = WidgetRepo::insert(&mut self.tx, input)
            .await
            .map_err(store_err)?;
        Widget::try_from(row).map_err(row_err)
    }

    async fn update_widget(
        &mut self,
        id: DbId,
        update: &WidgetUpdate,
    ) -> Result<Option<Widget>, StoreError> {
        WidgetRepo::update(&mut self.tx, id, update)
            .await
            .map_err(store_err)?
            .map(Widget::try_from)
            .transpose()
            .map_err(row_err)
    }

    async fn delete_dashboard(&mut self, id: DbId) -> Result<bool, StoreError> {
        let rights = AccessRightRepo::delete_for_dashboard(&mut self.tx, id)
            .await
            .map_err(store_err)?;
        let deleted = DashboardRepo::delete(&mut self.tx, id)
            .await
            .map_err(store_err)?;
        tracing::debug!(dashboard_id = id, rights, deleted, "Deleted dashboard rows");
        Ok(deleted)
    }

    async fn delete_widget(&mut self, id: DbId) -> Result<bool, StoreError> {
        AccessRightRepo::delete_for_widget(&mut self.tx, id)
            .await
            .map_err(store_err)?;
        WidgetRepo::delete(&mut self.tx, id)
            .await
            .map_err(store_err)
    }

    async fn create_grant(&mut self, grant: &NewGrant) -> Result<DbId, StoreError> {
        AccessRightRepo::insert(&mut self.tx, grant.subject, grant.rank)
            .await
            .map_err(store_err)
    }

    async fn bind_grant(
        &mut self,
        access_right_id: DbId,
        resource: ResourceRef,
    ) -> Result<DbId, StoreError> {
        AccessRightRepo::bind(&mut self.tx, access_right_id, resource)
            .await
            .map_err(store_err)
    }

    async fn unbind_grant(
        &mut self,
        access_right_id: DbId,
        resource: ResourceRef,
    ) -> Result<bool, StoreError> {
        AccessRightRepo::unbind(&mut self.tx, access_right_id, resource)
            .await
            .map_err(store_err)
    }

    async fn delete_grant(&mut self, access_right_id: DbId) -> Result<bool, StoreError> {
        AccessRightRepo::delete(&mut self.tx, access_right_id)
            .await
            .map_err(store_err)
    }

    async fn update_rank(&mut self, access_right_id: DbId, rank: Rank) -> Result<bool, StoreError> {
        AccessRightRepo::update_rank(&mut self.tx, access_right_id, rank)
            .await
            .map_err(store_err)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(store_err)
    }
}
