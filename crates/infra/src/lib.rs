//! Infrastructure layer: store ports and adapters, identity provider port,
//! configuration, and the stateful session/access services.

pub mod config;
pub mod identity;
pub mod postgres;
pub mod services;
pub mod session_store;
pub mod store;
pub mod wiring;

pub use config::{ConfigError, GatehouseConfig};
pub use identity::{IdentityProvider, InMemoryIdentityProvider, ProviderError};
pub use services::{
    AccessGate, ApplyOutcome, NewAccountRouter, PendingRoleApplier, ProfileResolver, TeamError, TeamService,
};
pub use session_store::{SessionError, SessionHandle, SessionSnapshot, SessionStore};
pub use store::StoreError;
pub use wiring::{Ports, init_tracing};
