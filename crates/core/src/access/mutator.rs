//! Grant mutation: issue, revoke, and re-rank access rights.
//!
//! Every mutation requires the requester to hold Admin on the resource the
//! grant is (or will be) bound to. Each one locks that resource, then runs
//! its authorization check, its duplicate check and its writes inside one
//! unit of work, so concurrent mutations on a resource apply one at a time
//! and a grant is never left half-attached.

use std::sync::Arc;

use super::error::{AccessError, CheckTarget, StoreError};
use super::resolver::RightsResolver;
use super::store::{AccessStore, UnitOfWork};
use crate::grant::{Grant, GrantBinding, NewGrant, Subject};
use crate::rank::Rank;
use crate::resource::ResourceRef;
use crate::types::DbId;

#[derive(Clone)]
pub struct RightsMutator {
    store: Arc<dyn AccessStore>,
    resolver: RightsResolver,
}

impl RightsMutator {
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        let resolver = RightsResolver::new(Arc::clone(&store));
        Self { store, resolver }
    }

    /// Issue a grant of `rank` to `subject` on `resource`.
    pub async fn grant(
        &self,
        requester: DbId,
        resource: ResourceRef,
        subject: Subject,
        rank: Rank,
    ) -> Result<GrantBinding, AccessError> {
        let mut uow = self.store.begin().await?;
        uow.lock_resource(resource).await?;
        RightsResolver::check_in(uow.as_mut(), requester, resource, Rank::Admin).await?;

        if let Subject::User(user_id) = subject {
            if uow.direct_grant(user_id, resource).await?.is_some() {
                return Err(AccessError::RightExists { subject, resource });
            }
        }

        let binding = issue(uow.as_mut(), resource, NewGrant { subject, rank }).await?;
        uow.commit().await?;

        tracing::info!(
            requester,
            access_right_id = binding.access_right_id,
            association_id = binding.association_id,
            %resource,
            %subject,
            %rank,
            "Access right granted"
        );
        Ok(binding)
    }

    /// Revoke access right `access_right_id` from `resource`.
    ///
    /// The right must be bound to exactly that resource; a right bound
    /// elsewhere is reported as not found and left untouched.
    pub async fn revoke(
        &self,
        requester: DbId,
        resource: ResourceRef,
        access_right_id: DbId,
    ) -> Result<(), AccessError> {
        let mut uow = self.store.begin().await?;
        uow.lock_resource(resource).await?;
        RightsResolver::check_in(uow.as_mut(), requester, resource, Rank::Admin).await?;

        if !uow.unbind_grant(access_right_id, resource).await? {
            return Err(AccessError::RightNotFound {
                subject: requester,
                target: CheckTarget::AccessRight(access_right_id),
            });
        }
        uow.delete_grant(access_right_id).await?;
        uow.commit().await?;

        tracing::info!(requester, access_right_id, %resource, "Access right revoked");
        Ok(())
    }

    /// Change the rank of an existing access right.
    ///
    /// Authorized against the resource the right is bound to.
    pub async fn reassign(
        &self,
        requester: DbId,
        access_right_id: DbId,
        rank: Rank,
    ) -> Result<ResourceRef, AccessError> {
        let not_found = || AccessError::RightNotFound {
            subject: requester,
            target: CheckTarget::AccessRight(access_right_id),
        };

        let mut uow = self.store.begin().await?;
        let owner = uow
            .grant_owner(access_right_id)
            .await?
            .ok_or_else(not_found)?;
        uow.lock_resource(owner).await?;
        RightsResolver::check_in(uow.as_mut(), requester, owner, Rank::Admin).await?;

        if !uow.update_rank(access_right_id, rank).await? {
            return Err(not_found());
        }
        uow.commit().await?;

        tracing::info!(requester, access_right_id, resource = %owner, %rank, "Access right re-ranked");
        Ok(owner)
    }

    /// Every grant bound to `resource`.
    ///
    /// Unchecked; callers enforce Admin on `resource` before listing.
    pub async fn list_grants(&self, resource: ResourceRef) -> Result<Vec<Grant>, AccessError> {
        Ok(self.store.list_grants(resource).await?)
    }

    /// Bind an Admin grant for `owner` to a freshly created resource, inside
    /// the caller's unit of work.
    pub async fn seed_owner(
        &self,
        uow: &mut dyn UnitOfWork,
        resource: ResourceRef,
        owner: DbId,
    ) -> Result<GrantBinding, StoreError> {
        issue(
            uow,
            resource,
            NewGrant {
                subject: Subject::User(owner),
                rank: Rank::Admin,
            },
        )
        .await
    }

    pub fn resolver(&self) -> &RightsResolver {
        &self.resolver
    }
}

async fn issue(
    uow: &mut dyn UnitOfWork,
    resource: ResourceRef,
    grant: NewGrant,
) -> Result<GrantBinding, StoreError> {
    let access_right_id = uow.create_grant(&grant).await?;
    let association_id = uow.bind_grant(access_right_id, resource).await?;
    Ok(GrantBinding {
        association_id,
        access_right_id,
    })
}
