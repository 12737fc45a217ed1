//! Identity-provider session model and lifecycle events.
//!
//! Sessions are issued and refreshed by the external identity provider; this
//! crate only mirrors them. Token signatures are never verified here.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use gatehouse_core::UserId;

/// Opaque bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Provider-side metadata attached to a user at sign-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Role chosen on the registration form, when the provider carried it.
    #[serde(default)]
    pub role: Option<String>,
    /// Anything else the provider attached (OAuth claims, locale, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// The authenticated user as described by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub email: Option<String>,
    /// Account creation time (not the sign-in time).
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl SessionUser {
    /// Time elapsed since the account was created. Negative if the provider
    /// clock is ahead of ours.
    pub fn account_age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// Display name for a new profile row: metadata name, then e-mail, then empty.
    pub fn display_name(&self) -> String {
        self.user_metadata
            .full_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.email.clone())
            .unwrap_or_default()
    }

    pub fn email_or_empty(&self) -> String {
        self.email.clone().unwrap_or_default()
    }
}

/// A live session mirrored from the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: AccessToken,
    #[serde(default)]
    pub refresh_token: Option<AccessToken>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: SessionUser,
}

impl Session {
    pub fn user_id(&self) -> UserId {
        self.user.id
    }
}

/// Lifecycle events emitted by the identity provider, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityEvent {
    /// A sign-in completed (password, magic link or OAuth callback).
    SignedIn(Session),
    /// The session ended locally or remotely.
    SignedOut,
    /// The provider rotated the token. The payload may be missing when the
    /// provider fires the event without a live session.
    TokenRefreshed(Option<Session>),
}

impl IdentityEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            IdentityEvent::SignedIn(_) => "signed_in",
            IdentityEvent::SignedOut => "signed_out",
            IdentityEvent::TokenRefreshed(_) => "token_refreshed",
        }
    }
}
