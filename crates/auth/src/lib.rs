//! `gatehouse-auth`: pure identity and access boundary.
//!
//! This crate is intentionally decoupled from storage and from the identity
//! provider: every function here is deterministic and free of IO.

pub mod access;
pub mod guard;
pub mod onboarding;
pub mod pending;
pub mod profile;
pub mod roles;
pub mod routes;
pub mod session;

pub use access::{AccessLevel, AccessRecord, AccessStatus, TeamRoster, TenantOwnership};
pub use guard::{AccessLookup, GuardDecision, GuardExplanation, GuardInput, GuardRule, explain, guard};
pub use onboarding::{DEFAULT_NEW_ACCOUNT_WINDOW_SECS, NewAccountPlan, default_new_account_window};
pub use pending::PendingRoleMarker;
pub use profile::{Profile, ProfileUpsert};
pub use roles::{Capability, Role, classify, is_collaborator, is_manager};
pub use routes::{Destination, RoutePolicy, RouteRequirement};
pub use session::{AccessToken, IdentityEvent, Session, SessionUser, UserMetadata};
