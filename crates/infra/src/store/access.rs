use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use gatehouse_auth::AccessRecord;
use gatehouse_core::{AccessRecordId, TenantId, UserId};

use super::StoreError;

/// Tenant admission records (`condominio_acessos` table).
#[async_trait]
pub trait AccessRecordStore: Send + Sync {
    /// The user's admission record. With a tenant context, only that
    /// tenant's record; without one, the most recently created record.
    async fn find_for_user(
        &self,
        user_id: UserId,
        tenant_id: Option<TenantId>,
    ) -> Result<Option<AccessRecord>, StoreError>;

    async fn get(&self, id: AccessRecordId) -> Result<Option<AccessRecord>, StoreError>;

    async fn list_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<AccessRecord>, StoreError>;

    /// Insert a new record. At most one record per (tenant, user).
    async fn insert(&self, record: AccessRecord) -> Result<(), StoreError>;

    /// Persist status / access-level changes of an existing record.
    async fn update(&self, record: &AccessRecord) -> Result<(), StoreError>;

    async fn delete(&self, id: AccessRecordId) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> AccessRecordStore for Arc<S>
where
    S: AccessRecordStore + ?Sized,
{
    async fn find_for_user(
        &self,
        user_id: UserId,
        tenant_id: Option<TenantId>,
    ) -> Result<Option<AccessRecord>, StoreError> {
        (**self).find_for_user(user_id, tenant_id).await
    }

    async fn get(&self, id: AccessRecordId) -> Result<Option<AccessRecord>, StoreError> {
        (**self).get(id).await
    }

    async fn list_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<AccessRecord>, StoreError> {
        (**self).list_for_tenant(tenant_id).await
    }

    async fn insert(&self, record: AccessRecord) -> Result<(), StoreError> {
        (**self).insert(record).await
    }

    async fn update(&self, record: &AccessRecord) -> Result<(), StoreError> {
        (**self).update(record).await
    }

    async fn delete(&self, id: AccessRecordId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}

/// In-memory admission store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAccessRecordStore {
    records: RwLock<HashMap<AccessRecordId, AccessRecord>>,
}

impl InMemoryAccessRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl AccessRecordStore for InMemoryAccessRecordStore {
    async fn find_for_user(
        &self,
        user_id: UserId,
        tenant_id: Option<TenantId>,
    ) -> Result<Option<AccessRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records
            .values()
            .filter(|r| r.user_id == user_id)
            .filter(|r| tenant_id.is_none_or(|t| r.tenant_id == t))
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn get(&self, id: AccessRecordId) -> Result<Option<AccessRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.get(&id).cloned())
    }

    async fn list_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<AccessRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        let mut out: Vec<AccessRecord> = records
            .values()
            .filter(|r| r.tenant_id == tenant_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.created_at);
        Ok(out)
    }

    async fn insert(&self, record: AccessRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        let duplicate = records
            .values()
            .any(|r| r.tenant_id == record.tenant_id && r.user_id == record.user_id);
        if duplicate || records.contains_key(&record.id) {
            return Err(StoreError::Conflict(format!(
                "access record for user {} in tenant {}",
                record.user_id, record.tenant_id
            )));
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn update(&self, record: &AccessRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        match records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, id: AccessRecordId) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        records.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}
