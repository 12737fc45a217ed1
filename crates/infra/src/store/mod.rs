//! Ports onto the tenant data store and the client-local marker store.
//!
//! Every trait is object-safe (`async_trait`) so services can hold
//! `Arc<dyn ...>` and tests can swap in the in-memory adapters.

use thiserror::Error;

pub mod access;
pub mod marker;
pub mod profiles;
pub mod tenants;

pub use access::{AccessRecordStore, InMemoryAccessRecordStore};
pub use marker::{InMemoryMarkerStore, JsonFileMarkerStore, MarkerStore};
pub use profiles::{InMemoryProfileStore, ProfileRow, ProfileStore};
pub use tenants::{InMemoryTenantDirectory, TenantDirectory};

/// Store operation error.
///
/// These are **infrastructure errors** as opposed to domain errors. Services
/// recover from them locally; none of them reaches the router.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An expected column is missing from the live schema (schema drift).
    #[error("column unavailable: {0}")]
    MissingColumn(String),

    /// The backend could not be reached or rejected the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("record already exists: {0}")]
    Conflict(String),

    #[error("not found")]
    NotFound,

    /// In-memory adapter lock poisoning.
    #[error("store lock poisoned")]
    Poisoned,
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
