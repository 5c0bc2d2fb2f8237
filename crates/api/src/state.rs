use std::sync::Arc;

use nsi_core::access::{AccessStore, Deadline, RightsMutator};
use nsi_core::services::{DashboardService, WidgetService};
use nsi_events::EventBus;

use crate::auth::identity::{IdentityProvider, JwtIdentity};
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cloned per request by Axum, so every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Persistence collaborator for dashboards, widgets and grants.
    pub store: Arc<dyn AccessStore>,
    /// Server configuration (timeouts, CORS, JWT settings).
    pub config: Arc<ServerConfig>,
    /// Validates bearer tokens into user ids.
    pub identity: Arc<dyn IdentityProvider>,
    /// Change notifications fan out from here to the outbox.
    pub event_bus: Arc<EventBus>,
    pub dashboards: DashboardService,
    pub widgets: WidgetService,
    pub rights: RightsMutator,
}

impl AppState {
    /// Wire the services over `store`, validating tokens with the
    /// configured JWT secret.
    pub fn new(store: Arc<dyn AccessStore>, config: ServerConfig, event_bus: Arc<EventBus>) -> Self {
        let identity = Arc::new(JwtIdentity::new(config.jwt.clone()));
        Self::with_identity(store, config, event_bus, identity)
    }

    pub fn with_identity(
        store: Arc<dyn AccessStore>,
        config: ServerConfig,
        event_bus: Arc<EventBus>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let notifier = Arc::clone(&event_bus);
        Self {
            dashboards: DashboardService::new(Arc::clone(&store), notifier.clone()),
            widgets: WidgetService::new(Arc::clone(&store), notifier),
            rights: RightsMutator::new(Arc::clone(&store)),
            store,
            config: Arc::new(config),
            identity,
            event_bus,
        }
    }

    /// A fresh deadline for one request's access-control work.
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.config.operation_timeout())
    }
}
