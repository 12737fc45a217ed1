use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use gatehouse_auth::{Profile, ProfileUpsert, Role};
use gatehouse_core::UserId;

use super::StoreError;

/// Profile row as read from the data store. `role` may be null in legacy
/// rows and is always `None` on the degraded read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<String>,
}

impl ProfileRow {
    /// Convert to a domain profile; a null/blank role becomes `"sindico"`.
    pub fn into_profile(self) -> Profile {
        Profile {
            id: self.id,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            avatar_url: self.avatar_url,
            role: Role::or_default(self.role),
        }
    }
}

impl From<Profile> for ProfileRow {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            full_name: p.full_name,
            email: p.email,
            phone: p.phone,
            avatar_url: p.avatar_url,
            role: Some(p.role.as_str().to_string()),
        }
    }
}

/// Profile persistence (`profiles` table), keyed by user id.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Full-column read, including `role`.
    ///
    /// Returns [`StoreError::MissingColumn`] when the live schema lacks `role`.
    async fn find(&self, id: UserId) -> Result<Option<ProfileRow>, StoreError>;

    /// Read every column except `role` (degraded schema path).
    async fn find_without_role(&self, id: UserId) -> Result<Option<ProfileRow>, StoreError>;

    /// Idempotent insert-or-update keyed by `id`.
    async fn upsert(&self, upsert: ProfileUpsert) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> ProfileStore for Arc<S>
where
    S: ProfileStore + ?Sized,
{
    async fn find(&self, id: UserId) -> Result<Option<ProfileRow>, StoreError> {
        (**self).find(id).await
    }

    async fn find_without_role(&self, id: UserId) -> Result<Option<ProfileRow>, StoreError> {
        (**self).find_without_role(id).await
    }

    async fn upsert(&self, upsert: ProfileUpsert) -> Result<(), StoreError> {
        (**self).upsert(upsert).await
    }
}

/// In-memory profile store for tests/dev.
///
/// `without_role_column()` simulates a deployment whose schema lacks the
/// `role` column: full reads and upserts fail with `MissingColumn`.
#[derive(Debug)]
pub struct InMemoryProfileStore {
    rows: RwLock<HashMap<UserId, ProfileRow>>,
    has_role_column: AtomicBool,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            has_role_column: AtomicBool::new(true),
        }
    }

    pub fn without_role_column() -> Self {
        let store = Self::new();
        store.has_role_column.store(false, Ordering::SeqCst);
        store
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Seed a row directly, bypassing upsert semantics.
    pub fn insert_row(&self, row: ProfileRow) {
        if let Ok(mut rows) = self.rows.write() {
            rows.insert(row.id, row);
        }
    }

    pub fn row(&self, id: UserId) -> Option<ProfileRow> {
        self.rows.read().ok()?.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_role_column(&self) -> Result<(), StoreError> {
        if self.has_role_column.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::MissingColumn("profiles.role".to_string()))
        }
    }
}

impl Default for InMemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn find(&self, id: UserId) -> Result<Option<ProfileRow>, StoreError> {
        self.ensure_role_column()?;
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.get(&id).cloned())
    }

    async fn find_without_role(&self, id: UserId) -> Result<Option<ProfileRow>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.get(&id).cloned().map(|row| ProfileRow { role: None, ..row }))
    }

    async fn upsert(&self, upsert: ProfileUpsert) -> Result<(), StoreError> {
        self.ensure_role_column()?;
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        let existing = rows.get(&upsert.id).cloned().map(ProfileRow::into_profile);
        let merged = upsert.merge_into(existing);
        rows.insert(merged.id, merged.into());
        Ok(())
    }
}
