use serde::{Deserialize, Serialize};

use gatehouse_core::UserId;

use crate::roles::{Capability, Role};
use crate::session::SessionUser;

/// Application profile row, one per identity-provider user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Same value as the provider user id.
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
}

impl Profile {
    /// Build the in-memory profile for a user that has no row yet.
    ///
    /// The role comes from the provider metadata hint, defaulting to
    /// `"sindico"`. `full_name` is the metadata name only; the e-mail
    /// fallback applies to the persisted row (see [`ProfileUpsert::provisioned`]).
    pub fn provisioned(user: &SessionUser) -> Self {
        Self {
            id: user.id,
            full_name: user.user_metadata.full_name.clone().unwrap_or_default(),
            email: user.email_or_empty(),
            phone: None,
            avatar_url: user.user_metadata.avatar_url.clone(),
            role: Role::or_default(user.user_metadata.role.clone()),
        }
    }

    pub fn capability(&self) -> Capability {
        self.role.capability()
    }

    pub fn is_manager(&self) -> bool {
        self.capability() == Capability::Manager
    }

    pub fn is_collaborator(&self) -> bool {
        self.capability() == Capability::Collaborator
    }

    /// The upsert that persists this profile. `phone` is never written here.
    pub fn to_upsert(&self) -> ProfileUpsert {
        ProfileUpsert {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            avatar_url: self.avatar_url.clone(),
            role: self.role.clone(),
        }
    }
}

/// Column set written by an idempotent upsert keyed by `id`.
///
/// Columns not listed here (e.g. `phone`) keep their stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpsert {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role: Role,
}

impl ProfileUpsert {
    /// Upsert creating the row for a user seen for the first time. The
    /// stored name falls back to the e-mail when the provider has none.
    pub fn provisioned(user: &SessionUser) -> Self {
        Self {
            full_name: user.display_name(),
            ..Profile::provisioned(user).to_upsert()
        }
    }

    /// Upsert applying an explicit role chosen before an OAuth redirect.
    pub fn with_role(user: &SessionUser, role: Role) -> Self {
        Self {
            id: user.id,
            full_name: user.user_metadata.full_name.clone().unwrap_or_default(),
            email: user.email_or_empty(),
            avatar_url: user.user_metadata.avatar_url.clone(),
            role,
        }
    }

    /// Merge into an existing row (or create one), keeping unlisted columns.
    pub fn merge_into(self, existing: Option<Profile>) -> Profile {
        let phone = existing.and_then(|p| p.phone);
        Profile {
            id: self.id,
            full_name: self.full_name,
            email: self.email,
            phone,
            avatar_url: self.avatar_url,
            role: self.role,
        }
    }
}
