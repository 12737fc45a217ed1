use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use gatehouse_auth::{AccessLevel, AccessRecord, AccessStatus};
use gatehouse_core::{AccessRecordId, TenantId, UserId};

use super::map_sqlx_error;
use crate::store::{AccessRecordStore, StoreError};

const COLUMNS: &str = "id, condominio_id, user_id, status, colaborador_nome, nivel_acesso, created_at";

/// `condominio_acessos` table adapter.
#[derive(Debug, Clone)]
pub struct PgAccessRecordStore {
    pool: Arc<PgPool>,
}

impl PgAccessRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

fn decode_row(operation: &str, row: &PgRow) -> Result<AccessRecord, StoreError> {
    let get = |e| map_sqlx_error(operation, e);

    let status: String = row.try_get("status").map_err(get)?;
    let status: AccessStatus = status
        .parse()
        .map_err(|e| StoreError::Serialization(format!("{operation}: {e}")))?;

    Ok(AccessRecord {
        id: AccessRecordId::from_uuid(row.try_get("id").map_err(get)?),
        tenant_id: TenantId::from_uuid(row.try_get("condominio_id").map_err(get)?),
        user_id: UserId::from_uuid(row.try_get("user_id").map_err(get)?),
        status,
        collaborator_name: row.try_get("colaborador_nome").map_err(get)?,
        access_level: row
            .try_get::<Option<String>, _>("nivel_acesso")
            .map_err(get)?
            .map(AccessLevel::new),
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(get)?,
    })
}

#[async_trait]
impl AccessRecordStore for PgAccessRecordStore {
    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn find_for_user(
        &self,
        user_id: UserId,
        tenant_id: Option<TenantId>,
    ) -> Result<Option<AccessRecord>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM condominio_acessos \
             WHERE user_id = $1 AND ($2::uuid IS NULL OR condominio_id = $2) \
             ORDER BY created_at DESC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(user_id.as_uuid())
            .bind(tenant_id.map(|t| *t.as_uuid()))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_access_for_user", e))?;

        row.map(|r| decode_row("find_access_for_user", &r)).transpose()
    }

    #[instrument(skip(self), fields(access_id = %id), err)]
    async fn get(&self, id: AccessRecordId) -> Result<Option<AccessRecord>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM condominio_acessos WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_access", e))?;

        row.map(|r| decode_row("get_access", &r)).transpose()
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn list_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<AccessRecord>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM condominio_acessos WHERE condominio_id = $1 ORDER BY created_at ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(tenant_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_access_for_tenant", e))?;

        rows.iter()
            .map(|r| decode_row("list_access_for_tenant", r))
            .collect()
    }

    #[instrument(skip(self, record), fields(access_id = %record.id, tenant_id = %record.tenant_id), err)]
    async fn insert(&self, record: AccessRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO condominio_acessos
                (id, condominio_id, user_id, status, colaborador_nome, nivel_acesso, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.tenant_id.as_uuid())
        .bind(record.user_id.as_uuid())
        .bind(record.status.as_str())
        .bind(record.collaborator_name.as_deref())
        .bind(record.access_level.as_ref().map(AccessLevel::as_str))
        .bind(record.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_access", e))?;

        Ok(())
    }

    #[instrument(skip(self, record), fields(access_id = %record.id, status = %record.status), err)]
    async fn update(&self, record: &AccessRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE condominio_acessos
            SET status = $2, nivel_acesso = $3
            WHERE id = $1
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.status.as_str())
        .bind(record.access_level.as_ref().map(AccessLevel::as_str))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_access", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(access_id = %id), err)]
    async fn delete(&self, id: AccessRecordId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM condominio_acessos WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_access", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
