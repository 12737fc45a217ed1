//! Client-local storage for the pending-role marker.
//!
//! The marker must survive the round-trip through an external OAuth page, so
//! the production adapter is a small JSON file next to the client's other
//! local state.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use gatehouse_auth::PendingRoleMarker;

use super::StoreError;

/// Single-slot key/value store for [`PendingRoleMarker`].
#[async_trait]
pub trait MarkerStore: Send + Sync {
    async fn get(&self) -> Result<Option<PendingRoleMarker>, StoreError>;

    async fn set(&self, marker: PendingRoleMarker) -> Result<(), StoreError>;

    /// Remove the marker. Deleting an absent marker succeeds.
    async fn delete(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> MarkerStore for Arc<S>
where
    S: MarkerStore + ?Sized,
{
    async fn get(&self) -> Result<Option<PendingRoleMarker>, StoreError> {
        (**self).get().await
    }

    async fn set(&self, marker: PendingRoleMarker) -> Result<(), StoreError> {
        (**self).set(marker).await
    }

    async fn delete(&self) -> Result<(), StoreError> {
        (**self).delete().await
    }
}

/// In-memory marker store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryMarkerStore {
    slot: Mutex<Option<PendingRoleMarker>>,
}

impl InMemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl MarkerStore for InMemoryMarkerStore {
    async fn get(&self) -> Result<Option<PendingRoleMarker>, StoreError> {
        let slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(slot.clone())
    }

    async fn set(&self, marker: PendingRoleMarker) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = Some(marker);
        Ok(())
    }

    async fn delete(&self) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = None;
        Ok(())
    }
}

/// Marker persisted as a JSON document at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileMarkerStore {
    path: PathBuf,
}

impl JsonFileMarkerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MarkerStore for JsonFileMarkerStore {
    async fn get(&self) -> Result<Option<PendingRoleMarker>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, marker: PendingRoleMarker) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&marker)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    async fn delete(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
