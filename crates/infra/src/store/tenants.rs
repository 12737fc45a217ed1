use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use gatehouse_auth::TenantOwnership;
use gatehouse_core::{TenantId, UserId};

use super::StoreError;

/// Read-only view of tenant ownership (`condominios.sindico_id`).
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Number of tenants owned by `owner`.
    async fn count_owned(&self, owner: UserId) -> Result<u64, StoreError>;

    async fn ownership(&self, tenant_id: TenantId) -> Result<Option<TenantOwnership>, StoreError>;
}

#[async_trait]
impl<S> TenantDirectory for Arc<S>
where
    S: TenantDirectory + ?Sized,
{
    async fn count_owned(&self, owner: UserId) -> Result<u64, StoreError> {
        (**self).count_owned(owner).await
    }

    async fn ownership(&self, tenant_id: TenantId) -> Result<Option<TenantOwnership>, StoreError> {
        (**self).ownership(tenant_id).await
    }
}

/// In-memory tenant directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryTenantDirectory {
    owners: RwLock<HashMap<TenantId, UserId>>,
}

impl InMemoryTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn add_tenant(&self, tenant_id: TenantId, owner: UserId) {
        if let Ok(mut owners) = self.owners.write() {
            owners.insert(tenant_id, owner);
        }
    }
}

#[async_trait]
impl TenantDirectory for InMemoryTenantDirectory {
    async fn count_owned(&self, owner: UserId) -> Result<u64, StoreError> {
        let owners = self.owners.read().map_err(|_| StoreError::Poisoned)?;
        Ok(owners.values().filter(|o| **o == owner).count() as u64)
    }

    async fn ownership(&self, tenant_id: TenantId) -> Result<Option<TenantOwnership>, StoreError> {
        let owners = self.owners.read().map_err(|_| StoreError::Poisoned)?;
        Ok(owners
            .get(&tenant_id)
            .map(|owner_id| TenantOwnership { tenant_id, owner_id: *owner_id }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_only_owned_tenants() {
        let dir = InMemoryTenantDirectory::new();
        let (alice, bob) = (UserId::new(), UserId::new());
        dir.add_tenant(TenantId::new(), alice);
        dir.add_tenant(TenantId::new(), alice);
        dir.add_tenant(TenantId::new(), bob);

        assert_eq!(dir.count_owned(alice).await.unwrap(), 2);
        assert_eq!(dir.count_owned(UserId::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ownership_lookup() {
        let dir = InMemoryTenantDirectory::new();
        let (tenant, owner) = (TenantId::new(), UserId::new());
        dir.add_tenant(tenant, owner);

        let found = dir.ownership(tenant).await.unwrap().unwrap();
        assert_eq!(found.owner_id, owner);
        assert!(dir.ownership(TenantId::new()).await.unwrap().is_none());
    }
}
