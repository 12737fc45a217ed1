//! Assembles ports and services from configuration.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::GatehouseConfig;
use crate::identity::IdentityProvider;
use crate::postgres::{PgAccessRecordStore, PgProfileStore, PgTenantDirectory};
use crate::services::{AccessGate, TeamService};
use crate::session_store::SessionStore;
use crate::store::{
    AccessRecordStore, InMemoryAccessRecordStore, InMemoryMarkerStore, InMemoryProfileStore,
    InMemoryTenantDirectory, JsonFileMarkerStore, MarkerStore, ProfileStore, TenantDirectory,
};

/// Install process-wide tracing as configured. Later calls are no-ops.
pub fn init_tracing(config: &GatehouseConfig) {
    gatehouse_observability::init_with(&config.observability);
}

/// Every external dependency of the engine, as shared trait objects.
#[derive(Clone)]
pub struct Ports {
    pub provider: Arc<dyn IdentityProvider>,
    pub profiles: Arc<dyn ProfileStore>,
    pub records: Arc<dyn AccessRecordStore>,
    pub tenants: Arc<dyn TenantDirectory>,
    pub markers: Arc<dyn MarkerStore>,
}

impl Ports {
    /// All-in-memory ports around `provider`.
    pub fn in_memory(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            profiles: InMemoryProfileStore::arc(),
            records: InMemoryAccessRecordStore::arc(),
            tenants: InMemoryTenantDirectory::arc(),
            markers: InMemoryMarkerStore::arc(),
        }
    }

    /// Postgres stores when `database_url` is set, JSON marker file when
    /// `marker_path` is set; in-memory otherwise.
    pub async fn from_config(config: &GatehouseConfig, provider: Arc<dyn IdentityProvider>) -> anyhow::Result<Self> {
        let mut ports = Self::in_memory(provider);

        if let Some(url) = &config.database_url {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .context("failed to connect to the tenant data store")?;
            info!("using postgres stores");
            ports.profiles = Arc::new(PgProfileStore::new(pool.clone()));
            ports.records = Arc::new(PgAccessRecordStore::new(pool.clone()));
            ports.tenants = Arc::new(PgTenantDirectory::new(pool));
        }

        if let Some(path) = &config.marker_path {
            ports.markers = Arc::new(JsonFileMarkerStore::new(path));
        }

        Ok(ports)
    }

    pub fn session_store(&self, config: &GatehouseConfig) -> SessionStore {
        SessionStore::new(
            self.provider.clone(),
            self.profiles.clone(),
            self.markers.clone(),
            self.tenants.clone(),
        )
        .with_new_account_window(config.new_account_window())
    }

    pub fn access_gate(&self, config: &GatehouseConfig) -> AccessGate<Arc<dyn AccessRecordStore>> {
        AccessGate::with_policy(self.records.clone(), config.routes.clone())
    }

    pub fn team(&self) -> TeamService<Arc<dyn AccessRecordStore>, Arc<dyn TenantDirectory>> {
        TeamService::new(self.records.clone(), self.tenants.clone())
    }
}
