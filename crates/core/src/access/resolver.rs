//! Rights resolution.
//!
//! Dashboards are resolved from their direct grant only. Widgets resolve an
//! effective grant from two candidates: the grant bound to the widget, and an
//! Admin grant bound to the widget's owning dashboard. A direct widget grant
//! always wins, whatever its rank; the dashboard candidate is only consulted
//! when there is none, and a dashboard grant below Admin never propagates.

use std::sync::Arc;

use super::error::{AccessError, CheckTarget, StoreError};
use super::store::{AccessStore, UnitOfWork};
use crate::grant::Grant;
use crate::rank::Rank;
use crate::resource::ResourceRef;
use crate::types::DbId;

/// Precedence between a direct and an inherited candidate.
pub fn prefer_direct<T>(direct: Option<T>, inherited: Option<T>) -> Option<T> {
    direct.or(inherited)
}

/// Answers "does user X hold at least rank R on Y?" against the store.
///
/// Holds no per-request state and caches nothing; every check is a fresh
/// read.
#[derive(Clone)]
pub struct RightsResolver {
    store: Arc<dyn AccessStore>,
}

impl RightsResolver {
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        Self { store }
    }

    /// Dispatch to the dashboard or widget rule.
    pub async fn check(
        &self,
        subject: DbId,
        resource: ResourceRef,
        required: Rank,
    ) -> Result<Grant, AccessError> {
        match resource {
            ResourceRef::Dashboard(id) => self.check_dashboard_right(subject, id, required).await,
            ResourceRef::Widget(id) => self.check_widget_right(subject, id, required).await,
        }
    }

    pub async fn check_dashboard_right(
        &self,
        subject: DbId,
        dashboard_id: DbId,
        required: Rank,
    ) -> Result<Grant, AccessError> {
        let resource = ResourceRef::Dashboard(dashboard_id);
        let grant = self.store.direct_grant(subject, resource).await?;
        compare(subject, CheckTarget::Resource(resource), grant, required)
    }

    pub async fn check_widget_right(
        &self,
        subject: DbId,
        widget_id: DbId,
        required: Rank,
    ) -> Result<Grant, AccessError> {
        let grant = self.effective_widget_grant(subject, widget_id).await?;
        compare(
            subject,
            CheckTarget::Resource(ResourceRef::Widget(widget_id)),
            grant,
            required,
        )
    }

    /// Lookup by access right id, scoped to rights held by `subject`.
    pub async fn check_access_right(
        &self,
        subject: DbId,
        access_right_id: DbId,
        required: Rank,
    ) -> Result<Grant, AccessError> {
        let grant = self.store.grant_by_id(subject, access_right_id).await?;
        compare(
            subject,
            CheckTarget::AccessRight(access_right_id),
            grant,
            required,
        )
    }

    /// The grant that represents `subject`'s access to a widget, if any.
    pub async fn effective_widget_grant(
        &self,
        subject: DbId,
        widget_id: DbId,
    ) -> Result<Option<Grant>, StoreError> {
        let direct = self
            .store
            .direct_grant(subject, ResourceRef::Widget(widget_id))
            .await?;
        if direct.is_some() {
            return Ok(direct);
        }

        let Some(dashboard_id) = self.store.widget_dashboard(widget_id).await? else {
            return Ok(None);
        };
        let inherited = self
            .store
            .inherited_admin_grant(subject, dashboard_id)
            .await?
            .filter(|grant| grant.rank == Rank::Admin);

        Ok(prefer_direct(direct, inherited))
    }

    /// [`Self::check`] answered through an open unit of work, so it sees the
    /// transaction's own writes and waits on its locks.
    pub async fn check_in(
        uow: &mut dyn UnitOfWork,
        subject: DbId,
        resource: ResourceRef,
        required: Rank,
    ) -> Result<Grant, AccessError> {
        let direct = uow.direct_grant(subject, resource).await?;
        let inherited = match (resource, &direct) {
            (ResourceRef::Widget(widget_id), None) => {
                match uow.widget_dashboard(widget_id).await? {
                    Some(dashboard_id) => uow
                        .inherited_admin_grant(subject, dashboard_id)
                        .await?
                        .filter(|grant| grant.rank == Rank::Admin),
                    None => None,
                }
            }
            _ => None,
        };
        compare(
            subject,
            CheckTarget::Resource(resource),
            prefer_direct(direct, inherited),
            required,
        )
    }
}

fn compare(
    subject: DbId,
    target: CheckTarget,
    grant: Option<Grant>,
    required: Rank,
) -> Result<Grant, AccessError> {
    let Some(grant) = grant else {
        tracing::debug!(subject, %target, %required, "No applicable access right");
        return Err(AccessError::RightNotFound { subject, target });
    };

    if grant.rank.satisfies(required) {
        tracing::debug!(subject, %target, held = %grant.rank, %required, "Access granted");
        Ok(grant)
    } else {
        tracing::debug!(subject, %target, held = %grant.rank, %required, "Access rank too low");
        Err(AccessError::InsufficientRank {
            held: grant.rank,
            required,
        })
    }
}
