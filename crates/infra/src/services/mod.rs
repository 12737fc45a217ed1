//! Stateful services composed from the store ports.
//!
//! Each service is generic over its ports so tests can pass the in-memory
//! adapters directly and production wiring can pass `Arc<dyn ...>`.

pub mod access_gate;
pub mod new_account;
pub mod pending_role;
pub mod profile_resolver;
pub mod team;

pub use access_gate::AccessGate;
pub use new_account::NewAccountRouter;
pub use pending_role::{ApplyOutcome, PendingRoleApplier};
pub use profile_resolver::ProfileResolver;
pub use team::{TeamError, TeamService};
