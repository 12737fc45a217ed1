//! First-run routing for accounts that were just created.

use chrono::{DateTime, Duration, Utc};

use crate::profile::Profile;
use crate::roles::Capability;
use crate::routes::Destination;
use crate::session::SessionUser;

/// Default age (seconds) under which a sign-in counts as a brand-new account.
pub const DEFAULT_NEW_ACCOUNT_WINDOW_SECS: i64 = 60;

pub fn default_new_account_window() -> Duration {
    Duration::seconds(DEFAULT_NEW_ACCOUNT_WINDOW_SECS)
}

/// What the onboarding router must do for a sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewAccountPlan {
    /// Returning user; nothing to do.
    Returning,
    /// New collaborator: send straight to tenant selection.
    Redirect(Destination),
    /// New manager: redirect to onboarding only if it owns no tenant yet.
    CheckOwnedTenants,
}

/// True when the account was created less than `window` ago.
///
/// A creation time in the future (clock skew) also counts as new.
pub fn is_new_account(user: &SessionUser, now: DateTime<Utc>, window: Duration) -> bool {
    user.account_age(now) < window
}

pub fn plan(user: &SessionUser, profile: &Profile, now: DateTime<Utc>, window: Duration) -> NewAccountPlan {
    if !is_new_account(user, now, window) {
        return NewAccountPlan::Returning;
    }
    match profile.capability() {
        Capability::Collaborator => NewAccountPlan::Redirect(Destination::SelectTenant),
        Capability::Manager => NewAccountPlan::CheckOwnedTenants,
    }
}

/// Resolve [`NewAccountPlan::CheckOwnedTenants`] once the owned-tenant count is known.
pub fn destination_for_owned_tenants(owned: u64) -> Option<Destination> {
    (owned == 0).then_some(Destination::Onboarding)
}

#[cfg(test)]
mod tests {
    use gatehouse_core::UserId;

    use super::*;
    use crate::roles::Role;
    use crate::session::UserMetadata;

    fn user_created(ago: Duration, now: DateTime<Utc>) -> SessionUser {
        SessionUser {
            id: UserId::new(),
            email: None,
            created_at: now - ago,
            user_metadata: UserMetadata::default(),
        }
    }

    fn profile_for(user: &SessionUser, role: &'static str) -> Profile {
        let mut p = Profile::provisioned(user);
        p.role = Role::new(role);
        p
    }

    #[test]
    fn new_collaborator_goes_to_tenant_selection() {
        let now = Utc::now();
        let u = user_created(Duration::seconds(5), now);
        let decided = plan(&u, &profile_for(&u, "colaborador"), now, default_new_account_window());
        assert_eq!(decided, NewAccountPlan::Redirect(Destination::SelectTenant));
    }

    #[test]
    fn new_manager_needs_tenant_count() {
        let now = Utc::now();
        let u = user_created(Duration::seconds(5), now);
        let decided = plan(&u, &profile_for(&u, "sindico"), now, default_new_account_window());
        assert_eq!(decided, NewAccountPlan::CheckOwnedTenants);
    }

    #[test]
    fn returning_user_is_left_alone() {
        let now = Utc::now();
        let u = user_created(Duration::days(30), now);
        let decided = plan(&u, &profile_for(&u, "colaborador"), now, default_new_account_window());
        assert_eq!(decided, NewAccountPlan::Returning);
    }

    #[test]
    fn window_boundary_is_exclusive() {
        let now = Utc::now();
        assert!(!is_new_account(&user_created(Duration::seconds(60), now), now, default_new_account_window()));
        assert!(is_new_account(&user_created(Duration::seconds(59), now), now, default_new_account_window()));
        assert!(is_new_account(&user_created(Duration::seconds(-3), now), now, default_new_account_window()));
    }

    #[test]
    fn onboarding_only_without_owned_tenants() {
        assert_eq!(destination_for_owned_tenants(0), Some(Destination::Onboarding));
        assert_eq!(destination_for_owned_tenants(1), None);
    }
}
