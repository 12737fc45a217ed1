use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use gatehouse_auth::onboarding::{self, NewAccountPlan};
use gatehouse_auth::{Destination, Profile, SessionUser};

use crate::store::TenantDirectory;

/// One-time post-sign-in destination for brand-new accounts.
#[derive(Debug, Clone)]
pub struct NewAccountRouter<T> {
    tenants: T,
    window: Duration,
}

impl<T: TenantDirectory> NewAccountRouter<T> {
    pub fn new(tenants: T) -> Self {
        Self {
            tenants,
            window: onboarding::default_new_account_window(),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub async fn decide(&self, user: &SessionUser, profile: &Profile, now: DateTime<Utc>) -> Option<Destination> {
        let destination = match onboarding::plan(user, profile, now, self.window) {
            NewAccountPlan::Returning => return None,
            NewAccountPlan::Redirect(destination) => Some(destination),
            NewAccountPlan::CheckOwnedTenants => match self.tenants.count_owned(user.id).await {
                Ok(owned) => onboarding::destination_for_owned_tenants(owned),
                Err(error) => {
                    warn!(user_id = %user.id, error = %error, operation = "count_owned_tenants", "new account not routed");
                    None
                }
            },
        };

        if let Some(destination) = destination {
            info!(user_id = %user.id, destination = destination.path(), "routing new account");
        }
        destination
    }
}
