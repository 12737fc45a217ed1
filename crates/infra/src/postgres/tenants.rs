use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use gatehouse_auth::TenantOwnership;
use gatehouse_core::{TenantId, UserId};

use super::map_sqlx_error;
use crate::store::{StoreError, TenantDirectory};

/// `condominios` table adapter (ownership via `sindico_id`).
#[derive(Debug, Clone)]
pub struct PgTenantDirectory {
    pool: Arc<PgPool>,
}

impl PgTenantDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

#[async_trait]
impl TenantDirectory for PgTenantDirectory {
    #[instrument(skip(self), fields(user_id = %owner), err)]
    async fn count_owned(&self, owner: UserId) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM condominios WHERE sindico_id = $1")
            .bind(owner.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_owned_tenants", e))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn ownership(&self, tenant_id: TenantId) -> Result<Option<TenantOwnership>, StoreError> {
        let row = sqlx::query("SELECT sindico_id FROM condominios WHERE id = $1")
            .bind(tenant_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("tenant_ownership", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let owner: uuid::Uuid = row
            .try_get("sindico_id")
            .map_err(|e| map_sqlx_error("tenant_ownership", e))?;

        Ok(Some(TenantOwnership {
            tenant_id,
            owner_id: UserId::from_uuid(owner),
        }))
    }
}
