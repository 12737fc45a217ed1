use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use gatehouse_auth::ProfileUpsert;
use gatehouse_core::UserId;

use super::map_sqlx_error;
use crate::store::{ProfileRow, ProfileStore, StoreError};

/// `profiles` table adapter.
#[derive(Debug, Clone)]
pub struct PgProfileStore {
    pool: Arc<PgPool>,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    async fn fetch(&self, operation: &str, sql: &str, id: UserId, with_role: bool) -> Result<Option<ProfileRow>, StoreError> {
        let row = sqlx::query(sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        row.map(|r| decode_row(&r, with_role))
            .transpose()
            .map_err(|e| map_sqlx_error(operation, e))
    }
}

fn decode_row(row: &PgRow, with_role: bool) -> Result<ProfileRow, sqlx::Error> {
    let id: uuid::Uuid = row.try_get("id")?;
    let role = if with_role { row.try_get("role")? } else { None };
    Ok(ProfileRow {
        id: UserId::from_uuid(id),
        full_name: row.try_get::<Option<String>, _>("full_name")?.unwrap_or_default(),
        email: row.try_get::<Option<String>, _>("email")?.unwrap_or_default(),
        phone: row.try_get("phone")?,
        avatar_url: row.try_get("avatar_url")?,
        role,
    })
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find(&self, id: UserId) -> Result<Option<ProfileRow>, StoreError> {
        self.fetch(
            "find_profile",
            r#"
            SELECT id, full_name, email, phone, avatar_url, role
            FROM profiles
            WHERE id = $1
            "#,
            id,
            true,
        )
        .await
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_without_role(&self, id: UserId) -> Result<Option<ProfileRow>, StoreError> {
        self.fetch(
            "find_profile_without_role",
            r#"
            SELECT id, full_name, email, phone, avatar_url
            FROM profiles
            WHERE id = $1
            "#,
            id,
            false,
        )
        .await
    }

    #[instrument(skip(self, upsert), fields(user_id = %upsert.id, role = %upsert.role.as_str()), err)]
    async fn upsert(&self, upsert: ProfileUpsert) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, full_name, email, avatar_url, role)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                email = EXCLUDED.email,
                avatar_url = EXCLUDED.avatar_url,
                role = EXCLUDED.role
            "#,
        )
        .bind(upsert.id.as_uuid())
        .bind(&upsert.full_name)
        .bind(&upsert.email)
        .bind(upsert.avatar_url.as_deref())
        .bind(upsert.role.as_str())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_profile", e))?;

        Ok(())
    }
}
