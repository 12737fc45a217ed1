//! Strongly-typed identifiers used across the domain.
//!
//! The identity provider and the tenant data store both key rows by UUID, so
//! every identifier is a UUID newtype. Mixing a user id with a tenant id is a
//! compile error.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $t:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Fresh time-ordered (v7) id, for rows this process creates.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Neither the provider nor the store ever issues the nil UUID.
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        /// Parses ids arriving as text (route params, provider payloads).
        /// Surrounding whitespace is ignored; the nil UUID is rejected.
        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let invalid = |reason: &dyn core::fmt::Display| {
                    DomainError::invalid_id(format!("{}: {}", stringify!($t), reason))
                };
                let uuid = Uuid::from_str(s.trim()).map_err(|e| invalid(&e))?;
                if uuid.is_nil() {
                    return Err(invalid(&"nil id"));
                }
                Ok(Self(uuid))
            }
        }
    };
}

uuid_id! {
    /// Identifier of a tenant (a managed property; multi-tenant boundary).
    TenantId
}

uuid_id! {
    /// Identifier of a user as issued by the identity provider.
    ///
    /// The profile row shares this identifier (`profiles.id = auth user id`).
    UserId
}

uuid_id! {
    /// Identifier of a single tenant admission record.
    AccessRecordId
}
