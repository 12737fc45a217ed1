use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument};

use gatehouse_auth::{AccessLevel, AccessRecord, Profile, TeamRoster, TenantOwnership};
use gatehouse_core::{AccessRecordId, DomainError, TenantId};

use crate::store::{AccessRecordStore, StoreError, TenantDirectory};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TeamError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Collaborator admission workflow: request, approve, reject, remove.
#[derive(Debug, Clone)]
pub struct TeamService<A, T> {
    records: A,
    tenants: T,
}

impl<A: AccessRecordStore, T: TenantDirectory> TeamService<A, T> {
    pub fn new(records: A, tenants: T) -> Self {
        Self { records, tenants }
    }

    #[instrument(skip(self, requester), fields(user_id = %requester.id, tenant_id = %tenant_id), err)]
    pub async fn request_access(
        &self,
        requester: &Profile,
        tenant_id: TenantId,
        now: DateTime<Utc>,
    ) -> Result<AccessRecord, TeamError> {
        self.ownership(tenant_id).await?;
        if self.records.find_for_user(requester.id, Some(tenant_id)).await?.is_some() {
            return Err(DomainError::conflict("access already requested for this tenant").into());
        }

        let record = AccessRecord::request(requester, tenant_id, now)?;
        self.records.insert(record.clone()).await?;
        info!(user_id = %requester.id, tenant_id = %tenant_id, "access requested");
        Ok(record)
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.id, access_id = %id), err)]
    pub async fn approve(&self, actor: &Profile, id: AccessRecordId) -> Result<AccessRecord, TeamError> {
        let (mut record, tenant) = self.load(id).await?;
        record.approve(actor, &tenant)?;
        self.records.update(&record).await?;
        info!(user_id = %actor.id, access_id = %id, collaborator = %record.user_id, "access approved");
        Ok(record)
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.id, access_id = %id), err)]
    pub async fn reject(&self, actor: &Profile, id: AccessRecordId) -> Result<AccessRecord, TeamError> {
        let (mut record, tenant) = self.load(id).await?;
        record.reject(actor, &tenant)?;
        self.records.update(&record).await?;
        info!(user_id = %actor.id, access_id = %id, collaborator = %record.user_id, "access rejected");
        Ok(record)
    }

    /// Delete the record; the collaborator is back to "no record".
    #[instrument(skip(self, actor), fields(user_id = %actor.id, access_id = %id), err)]
    pub async fn remove(&self, actor: &Profile, id: AccessRecordId) -> Result<(), TeamError> {
        let (record, tenant) = self.load(id).await?;
        record.ensure_removable_by(actor, &tenant)?;
        self.records.delete(id).await?;
        info!(user_id = %actor.id, access_id = %id, collaborator = %record.user_id, "access removed");
        Ok(())
    }

    #[instrument(skip(self, actor, level), fields(user_id = %actor.id, access_id = %id), err)]
    pub async fn set_access_level(
        &self,
        actor: &Profile,
        id: AccessRecordId,
        level: AccessLevel,
    ) -> Result<AccessRecord, TeamError> {
        let (mut record, tenant) = self.load(id).await?;
        record.grant_level(actor, &tenant, level)?;
        self.records.update(&record).await?;
        Ok(record)
    }

    /// The tenant's records grouped by status. Owner only.
    pub async fn roster(&self, actor: &Profile, tenant_id: TenantId) -> Result<TeamRoster, TeamError> {
        let tenant = self.ownership(tenant_id).await?;
        if !actor.is_manager() || actor.id != tenant.owner_id {
            return Err(DomainError::Unauthorized.into());
        }
        Ok(TeamRoster::from_records(self.records.list_for_tenant(tenant_id).await?))
    }

    async fn ownership(&self, tenant_id: TenantId) -> Result<TenantOwnership, TeamError> {
        self.tenants
            .ownership(tenant_id)
            .await?
            .ok_or_else(|| DomainError::not_found().into())
    }

    async fn load(&self, id: AccessRecordId) -> Result<(AccessRecord, TenantOwnership), TeamError> {
        let record = self.records.get(id).await?.ok_or(DomainError::NotFound)?;
        let tenant = self.ownership(record.tenant_id).await?;
        Ok((record, tenant))
    }
}
