//! In-memory [`AccessStore`] for unit and HTTP-level tests.
//!
//! A unit of work holds the state lock for its whole lifetime and mutates a
//! private copy that replaces the shared state on commit, so dropped or
//! failed units of work leave nothing behind. Failures and latency can be
//! injected to exercise error paths and deadlines.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::access::{AccessStore, GrantStore, ResourceStore, StoreError, UnitOfWork};
use crate::dashboard::{Dashboard, DashboardAccess, NewDashboard};
use crate::grant::{Grant, NewGrant, Subject};
use crate::notify::{ChangeNotifier, ChangeRecord};
use crate::rank::Rank;
use crate::resource::ResourceRef;
use crate::types::DbId;
use crate::widget::{NewWidget, Widget, WidgetType, WidgetUpdate};

#[derive(Debug, Clone, Copy)]
struct Binding {
    access_right_id: DbId,
    resource: ResourceRef,
}

#[derive(Debug, Clone, Default)]
struct Sequences {
    dashboard: DbId,
    widget: DbId,
    access_right: DbId,
    binding: DbId,
}

fn next(seq: &mut DbId) -> DbId {
    *seq += 1;
    *seq
}

#[derive(Debug, Clone, Default)]
struct State {
    dashboards: BTreeMap<DbId, Dashboard>,
    widgets: BTreeMap<DbId, Widget>,
    rights: BTreeMap<DbId, Grant>,
    bindings: BTreeMap<DbId, Binding>,
    seq: Sequences,
}

impl State {
    fn resource_exists(&self, resource: ResourceRef) -> bool {
        match resource {
            ResourceRef::Dashboard(id) => self.dashboards.contains_key(&id),
            ResourceRef::Widget(id) => self.widgets.contains_key(&id),
        }
    }

    fn owner_of(&self, access_right_id: DbId) -> Option<ResourceRef> {
        self.bindings
            .values()
            .find(|b| b.access_right_id == access_right_id)
            .map(|b| b.resource)
    }

    fn rights_on(&self, resource: ResourceRef) -> Vec<&Grant> {
        let mut rights: Vec<&Grant> = self
            .bindings
            .values()
            .filter(|b| b.resource == resource)
            .filter_map(|b| self.rights.get(&b.access_right_id))
            .collect();
        rights.sort_by_key(|g| g.id);
        rights
    }

    fn user_grant(&self, user_id: DbId, resource: ResourceRef, rank: Option<Rank>) -> Option<Grant> {
        self.rights_on(resource)
            .into_iter()
            .find(|g| g.subject == Subject::User(user_id) && rank.map_or(true, |r| g.rank == r))
            .cloned()
    }

    fn drop_resource_grants(&mut self, resource: ResourceRef) {
        let bound: Vec<(DbId, DbId)> = self
            .bindings
            .iter()
            .filter(|(_, b)| b.resource == resource)
            .map(|(id, b)| (*id, b.access_right_id))
            .collect();
        for (binding_id, right_id) in bound {
            self.bindings.remove(&binding_id);
            self.rights.remove(&right_id);
        }
    }

    fn insert_dashboard(&mut self, input: &NewDashboard) -> Result<Dashboard, StoreError> {
        if let Some(parent) = input.parent_id {
            if !self.dashboards.contains_key(&parent) {
                return Err(StoreError::Integrity(format!(
                    "parent dashboard {parent} does not exist"
                )));
            }
        }
        let dashboard = Dashboard {
            id: next(&mut self.seq.dashboard),
            name: input.name.clone(),
            parent_id: input.parent_id,
        };
        self.dashboards.insert(dashboard.id, dashboard.clone());
        Ok(dashboard)
    }

    fn insert_widget(&mut self, input: &NewWidget) -> Result<Widget, StoreError> {
        if !self.dashboards.contains_key(&input.dashboard_id) {
            return Err(StoreError::Integrity(format!(
                "dashboard {} does not exist",
                input.dashboard_id
            )));
        }
        let widget = Widget {
            id: next(&mut self.seq.widget),
            name: input.name.clone(),
            dashboard_id: input.dashboard_id,
            widget_type: input.widget_type,
            config: input.config.clone(),
        };
        self.widgets.insert(widget.id, widget.clone());
        Ok(widget)
    }

    fn create_grant(&mut self, grant: &NewGrant) -> DbId {
        let id = next(&mut self.seq.access_right);
        self.rights.insert(
            id,
            Grant {
                id,
                subject: grant.subject,
                access_token: None,
                rank: grant.rank,
            },
        );
        id
    }

    fn bind_grant(&mut self, access_right_id: DbId, resource: ResourceRef) -> Result<DbId, StoreError> {
        if !self.rights.contains_key(&access_right_id) {
            return Err(StoreError::Integrity(format!(
                "access right {access_right_id} does not exist"
            )));
        }
        if !self.resource_exists(resource) {
            return Err(StoreError::Integrity(format!("{resource} does not exist")));
        }
        if let Some(existing) = self.owner_of(access_right_id) {
            return Err(StoreError::Integrity(format!(
                "access right {access_right_id} is already bound to {existing}"
            )));
        }
        if let Some(Subject::User(user_id)) = self.rights.get(&access_right_id).map(|g| g.subject) {
            if self.user_grant(user_id, resource, None).is_some() {
                return Err(StoreError::Integrity(format!(
                    "user {user_id} already holds an access right on {resource}"
                )));
            }
        }
        let id = next(&mut self.seq.binding);
        self.bindings.insert(
            id,
            Binding {
                access_right_id,
                resource,
            },
        );
        Ok(id)
    }
}

#[derive(Debug, Default)]
struct Faults {
    fail_reads: AtomicBool,
    fail_grant_writes: AtomicBool,
    fail_commits: AtomicBool,
    latency_ms: AtomicU64,
}

/// Shared, cloneable in-memory store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    faults: Arc<Faults>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read fail with a backend error.
    pub fn fail_reads(&self, on: bool) {
        self.faults.fail_reads.store(on, Ordering::SeqCst);
    }

    /// Make binding an access right to a resource fail.
    pub fn fail_grant_writes(&self, on: bool) {
        self.faults.fail_grant_writes.store(on, Ordering::SeqCst);
    }

    pub fn fail_commits(&self, on: bool) {
        self.faults.fail_commits.store(on, Ordering::SeqCst);
    }

    /// Delay every read and every `begin` by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        let ms = latency.map_or(0, |d| d.as_millis() as u64);
        self.faults.latency_ms.store(ms, Ordering::SeqCst);
    }

    async fn before_read(&self) -> Result<(), StoreError> {
        let ms = self.faults.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        if self.faults.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::backend("injected read failure"));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Fixture helpers: write straight to the state, bypassing checks.
    // ------------------------------------------------------------------

    pub async fn seed_dashboard(&self, name: &str, parent_id: Option<DbId>) -> DbId {
        let mut state = self.state.lock().await;
        let id = next(&mut state.seq.dashboard);
        state.dashboards.insert(
            id,
            Dashboard {
                id,
                name: name.to_string(),
                parent_id,
            },
        );
        id
    }

    pub async fn seed_widget(&self, name: &str, dashboard_id: DbId) -> DbId {
        let mut state = self.state.lock().await;
        let id = next(&mut state.seq.widget);
        state.widgets.insert(
            id,
            Widget {
                id,
                name: name.to_string(),
                dashboard_id,
                widget_type: WidgetType::Square,
                config: String::new(),
            },
        );
        id
    }

    /// Create and bind an access right, returning its id.
    pub async fn seed_grant(&self, resource: ResourceRef, subject: Subject, rank: Rank) -> DbId {
        let mut state = self.state.lock().await;
        let id = state.create_grant(&NewGrant { subject, rank });
        let binding = next(&mut state.seq.binding);
        state.bindings.insert(
            binding,
            Binding {
                access_right_id: id,
                resource,
            },
        );
        id
    }

    /// Number of access right rows, bound or not.
    pub async fn grant_count(&self) -> usize {
        self.state.lock().await.rights.len()
    }

    pub async fn dashboard_count(&self) -> usize {
        self.state.lock().await.dashboards.len()
    }

    pub async fn widget_count(&self) -> usize {
        self.state.lock().await.widgets.len()
    }

    pub async fn grant_owner_of(&self, access_right_id: DbId) -> Option<ResourceRef> {
        self.state.lock().await.owner_of(access_right_id)
    }

    /// Id of the association row binding `access_right_id`, if bound.
    pub async fn association_of(&self, access_right_id: DbId) -> Option<DbId> {
        self.state
            .lock()
            .await
            .bindings
            .iter()
            .find(|(_, b)| b.access_right_id == access_right_id)
            .map(|(id, _)| *id)
    }

    /// Ids of the access rights bound to `resource`, ascending.
    pub async fn list_grants_raw(&self, resource: ResourceRef) -> Vec<DbId> {
        self.state
            .lock()
            .await
            .rights_on(resource)
            .into_iter()
            .map(|g| g.id)
            .collect()
    }
}

#[async_trait]
impl GrantStore for InMemoryStore {
    async fn direct_grant(
        &self,
        subject_id: DbId,
        resource: ResourceRef,
    ) -> Result<Option<Grant>, StoreError> {
        self.before_read().await?;
        Ok(self.state.lock().await.user_grant(subject_id, resource, None))
    }

    async fn inherited_admin_grant(
        &self,
        subject_id: DbId,
        parent_dashboard_id: DbId,
    ) -> Result<Option<Grant>, StoreError> {
        self.before_read().await?;
        Ok(self.state.lock().await.user_grant(
            subject_id,
            ResourceRef::Dashboard(parent_dashboard_id),
            Some(Rank::Admin),
        ))
    }

    async fn widget_dashboard(&self, widget_id: DbId) -> Result<Option<DbId>, StoreError> {
        self.before_read().await?;
        Ok(self
            .state
            .lock()
            .await
            .widgets
            .get(&widget_id)
            .map(|w| w.dashboard_id))
    }

    async fn grant_by_id(
        &self,
        subject_id: DbId,
        access_right_id: DbId,
    ) -> Result<Option<Grant>, StoreError> {
        self.before_read().await?;
        Ok(self
            .state
            .lock()
            .await
            .rights
            .get(&access_right_id)
            .filter(|g| g.subject == Subject::User(subject_id))
            .cloned())
    }

    async fn grant_owner(&self, access_right_id: DbId) -> Result<Option<ResourceRef>, StoreError> {
        self.before_read().await?;
        Ok(self.state.lock().await.owner_of(access_right_id))
    }

    async fn list_grants(&self, resource: ResourceRef) -> Result<Vec<Grant>, StoreError> {
        self.before_read().await?;
        Ok(self
            .state
            .lock()
            .await
            .rights_on(resource)
            .into_iter()
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn dashboard(&self, id: DbId) -> Result<Option<Dashboard>, StoreError> {
        self.before_read().await?;
        Ok(self.state.lock().await.dashboards.get(&id).cloned())
    }

    async fn dashboards_for_user(&self, user_id: DbId) -> Result<Vec<DashboardAccess>, StoreError> {
        self.before_read().await?;
        let state = self.state.lock().await;
        Ok(state
            .dashboards
            .values()
            .filter_map(|d| {
                state
                    .user_grant(user_id, ResourceRef::Dashboard(d.id), None)
                    .map(|g| DashboardAccess {
                        dashboard: d.clone(),
                        rank: g.rank,
                    })
            })
            .collect())
    }

    async fn widget(&self, id: DbId) -> Result<Option<Widget>, StoreError> {
        self.before_read().await?;
        Ok(self.state.lock().await.widgets.get(&id).cloned())
    }

    async fn widgets_in_dashboard(
        &self,
        user_id: DbId,
        dashboard_id: DbId,
    ) -> Result<Vec<(Widget, Option<Rank>)>, StoreError> {
        self.before_read().await?;
        let state = self.state.lock().await;
        Ok(state
            .widgets
            .values()
            .filter(|w| w.dashboard_id == dashboard_id)
            .map(|w| {
                let rank = state
                    .user_grant(user_id, ResourceRef::Widget(w.id), None)
                    .map(|g| g.rank);
                (w.clone(), rank)
            })
            .collect())
    }
}

#[async_trait]
impl AccessStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        self.before_read().await?;
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = State::clone(&guard);
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            working,
            faults: Arc::clone(&self.faults),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.before_read().await
    }
}

struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<State>,
    working: State,
    faults: Arc<Faults>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    // The state lock is already held for the whole unit of work.
    async fn lock_resource(&mut self, _resource: ResourceRef) -> Result<(), StoreError> {
        Ok(())
    }

    async fn direct_grant(
        &mut self,
        subject_id: DbId,
        resource: ResourceRef,
    ) -> Result<Option<Grant>, StoreError> {
        Ok(self.working.user_grant(subject_id, resource, None))
    }

    async fn inherited_admin_grant(
        &mut self,
        subject_id: DbId,
        parent_dashboard_id: DbId,
    ) -> Result<Option<Grant>, StoreError> {
        Ok(self.working.user_grant(
            subject_id,
            ResourceRef::Dashboard(parent_dashboard_id),
            Some(Rank::Admin),
        ))
    }

    async fn widget_dashboard(&mut self, widget_id: DbId) -> Result<Option<DbId>, StoreError> {
        Ok(self.working.widgets.get(&widget_id).map(|w| w.dashboard_id))
    }

    async fn grant_owner(&mut self, access_right_id: DbId) -> Result<Option<ResourceRef>, StoreError> {
        Ok(self.working.owner_of(access_right_id))
    }

    async fn insert_dashboard(&mut self, input: &NewDashboard) -> Result<Dashboard, StoreError> {
        self.working.insert_dashboard(input)
    }

    async fn insert_widget(&mut self, input: &NewWidget) -> Result<Widget, StoreError> {
        self.working.insert_widget(input)
    }

    async fn update_widget(
        &mut self,
        id: DbId,
        update: &WidgetUpdate,
    ) -> Result<Option<Widget>, StoreError> {
        let Some(widget) = self.working.widgets.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            widget.name = name.clone();
        }
        if let Some(config) = &update.config {
            widget.config = config.clone();
        }
        Ok(Some(widget.clone()))
    }

    async fn delete_dashboard(&mut self, id: DbId) -> Result<bool, StoreError> {
        let state = &mut self.working;
        if state.dashboards.remove(&id).is_none() {
            return Ok(false);
        }
        for child in state.dashboards.values_mut() {
            if child.parent_id == Some(id) {
                child.parent_id = None;
            }
        }
        let widget_ids: Vec<DbId> = state
            .widgets
            .values()
            .filter(|w| w.dashboard_id == id)
            .map(|w| w.id)
            .collect();
        for widget_id in widget_ids {
            state.widgets.remove(&widget_id);
            state.drop_resource_grants(ResourceRef::Widget(widget_id));
        }
        state.drop_resource_grants(ResourceRef::Dashboard(id));
        Ok(true)
    }

    async fn delete_widget(&mut self, id: DbId) -> Result<bool, StoreError> {
        if self.working.widgets.remove(&id).is_none() {
            return Ok(false);
        }
        self.working.drop_resource_grants(ResourceRef::Widget(id));
        Ok(true)
    }

    async fn create_grant(&mut self, grant: &NewGrant) -> Result<DbId, StoreError> {
        Ok(self.working.create_grant(grant))
    }

    async fn bind_grant(
        &mut self,
        access_right_id: DbId,
        resource: ResourceRef,
    ) -> Result<DbId, StoreError> {
        if self.faults.fail_grant_writes.load(Ordering::SeqCst) {
            return Err(StoreError::backend("injected grant write failure"));
        }
        self.working.bind_grant(access_right_id, resource)
    }

    async fn unbind_grant(
        &mut self,
        access_right_id: DbId,
        resource: ResourceRef,
    ) -> Result<bool, StoreError> {
        let binding_id = self
            .working
            .bindings
            .iter()
            .find(|(_, b)| b.access_right_id == access_right_id && b.resource == resource)
            .map(|(id, _)| *id);
        Ok(binding_id
            .and_then(|id| self.working.bindings.remove(&id))
            .is_some())
    }

    async fn delete_grant(&mut self, access_right_id: DbId) -> Result<bool, StoreError> {
        self.working
            .bindings
            .retain(|_, b| b.access_right_id != access_right_id);
        Ok(self.working.rights.remove(&access_right_id).is_some())
    }

    async fn update_rank(&mut self, access_right_id: DbId, rank: Rank) -> Result<bool, StoreError> {
        match self.working.rights.get_mut(&access_right_id) {
            Some(grant) => {
                grant.rank = rank;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if self.faults.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::backend("injected commit failure"));
        }
        let MemoryUnitOfWork {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}

/// Notifier that keeps every record it receives.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    records: StdMutex<Vec<ChangeRecord>>,
}

impl RecordingNotifier {
    pub fn records(&self) -> Vec<ChangeRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn event_types(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.event_type).collect()
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn notify(&self, record: ChangeRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn dropped_unit_of_work_rolls_back() {
        let store = InMemoryStore::new();
        {
            let mut uow = store.begin().await.unwrap();
            uow.insert_dashboard(&NewDashboard {
                name: "Draft".into(),
                parent_id: None,
            })
            .await
            .unwrap();
        }
        assert_eq!(store.dashboard_count().await, 0);
    }

    #[tokio::test]
    async fn access_right_binds_to_one_resource_only() {
        let store = InMemoryStore::new();
        let dashboard = store.seed_dashboard("Sales", None).await;
        let widget = store.seed_widget("Chart", dashboard).await;

        let mut uow = store.begin().await.unwrap();
        let id = uow
            .create_grant(&NewGrant {
                subject: Subject::User(1),
                rank: Rank::Admin,
            })
            .await
            .unwrap();
        uow.bind_grant(id, ResourceRef::Dashboard(dashboard))
            .await
            .unwrap();
        assert_matches!(
            uow.bind_grant(id, ResourceRef::Widget(widget)).await,
            Err(StoreError::Integrity(_))
        );
    }

    async fn bind_new(
        uow: &mut dyn UnitOfWork,
        subject: Subject,
        resource: ResourceRef,
    ) -> Result<DbId, StoreError> {
        let id = uow
            .create_grant(&NewGrant {
                subject,
                rank: Rank::ReadOnly,
            })
            .await?;
        uow.bind_grant(id, resource).await
    }

    #[tokio::test]
    async fn user_holds_at_most_one_right_per_resource() {
        let store = InMemoryStore::new();
        let dashboard = store.seed_dashboard("Sales", None).await;
        let widget = store.seed_widget("Chart", dashboard).await;
        let resource = ResourceRef::Dashboard(dashboard);

        let mut uow = store.begin().await.unwrap();
        bind_new(uow.as_mut(), Subject::User(1), resource).await.unwrap();
        bind_new(uow.as_mut(), Subject::UserGroup(1), resource).await.unwrap();
        bind_new(uow.as_mut(), Subject::UserGroup(1), resource).await.unwrap();
        bind_new(uow.as_mut(), Subject::User(1), ResourceRef::Widget(widget))
            .await
            .unwrap();
        assert_matches!(
            bind_new(uow.as_mut(), Subject::User(1), resource).await,
            Err(StoreError::Integrity(_))
        );
    }

    #[tokio::test]
    async fn deleting_dashboard_cascades_and_detaches_children() {
        let store = InMemoryStore::new();
        let parent = store.seed_dashboard("Parent", None).await;
        let child = store.seed_dashboard("Child", Some(parent)).await;
        let widget = store.seed_widget("Chart", parent).await;
        store
            .seed_grant(ResourceRef::Dashboard(parent), Subject::User(1), Rank::Admin)
            .await;
        store
            .seed_grant(ResourceRef::Widget(widget), Subject::User(2), Rank::ReadOnly)
            .await;
        let child_grant = store
            .seed_grant(ResourceRef::Dashboard(child), Subject::User(1), Rank::Admin)
            .await;

        let mut uow = store.begin().await.unwrap();
        assert!(uow.delete_dashboard(parent).await.unwrap());
        uow.commit().await.unwrap();

        assert_eq!(store.widget_count().await, 0);
        assert_eq!(store.grant_count().await, 1);
        assert_eq!(
            store.grant_owner_of(child_grant).await,
            Some(ResourceRef::Dashboard(child))
        );
        let child = store.dashboard(child).await.unwrap().unwrap();
        assert_eq!(child.parent_id, None);
    }
}
