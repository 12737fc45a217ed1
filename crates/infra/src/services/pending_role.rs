use tracing::{info, instrument, warn};

use gatehouse_auth::{ProfileUpsert, Role, SessionUser};

use crate::store::{MarkerStore, ProfileStore};

/// Result of one [`PendingRoleApplier::apply_if_present`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    NoMarker,
    Applied(Role),
    /// The upsert failed; the marker is gone anyway.
    Failed(Role),
}

/// Applies a role chosen before an OAuth redirect, at most once.
#[derive(Debug, Clone)]
pub struct PendingRoleApplier<M, P> {
    markers: M,
    profiles: P,
}

impl<M: MarkerStore, P: ProfileStore> PendingRoleApplier<M, P> {
    pub fn new(markers: M, profiles: P) -> Self {
        Self { markers, profiles }
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn apply_if_present(&self, user: &SessionUser) -> ApplyOutcome {
        let marker = match self.markers.get().await {
            Ok(marker) => marker,
            Err(error) => {
                warn!(user_id = %user.id, error = %error, operation = "read_marker", "pending role unreadable; discarding");
                self.erase(user).await;
                return ApplyOutcome::NoMarker;
            }
        };
        let Some(marker) = marker else {
            return ApplyOutcome::NoMarker;
        };

        let role = marker.role;
        let outcome = match self.profiles.upsert(ProfileUpsert::with_role(user, role.clone())).await {
            Ok(()) => {
                info!(user_id = %user.id, role = %role.as_str(), "pending role applied");
                ApplyOutcome::Applied(role)
            }
            Err(error) => {
                warn!(user_id = %user.id, role = %role.as_str(), error = %error, operation = "apply_pending_role", "pending role not applied");
                ApplyOutcome::Failed(role)
            }
        };

        self.erase(user).await;
        outcome
    }

    async fn erase(&self, user: &SessionUser) {
        if let Err(error) = self.markers.delete().await {
            warn!(user_id = %user.id, error = %error, operation = "delete_marker", "pending role marker not erased");
        }
    }
}
