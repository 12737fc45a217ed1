use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role string stored on a profile row.
///
/// Roles stay free-form strings at this layer. Only `"colaborador"` and the
/// manager family carry meaning; see [`classify`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// The only role that maps to [`Capability::Collaborator`].
    pub const COLLABORATOR: &'static str = "colaborador";

    /// Role assigned when a row or a provider hint carries none.
    pub const DEFAULT_MANAGER: &'static str = "sindico";

    /// Roles the product recognises as managers. Anything else that is not
    /// `"colaborador"` is still classified as a manager.
    pub const KNOWN_MANAGER_ROLES: [&'static str; 4] = ["sindico", "admin", "zelador", "funcionario"];

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn collaborator() -> Self {
        Self::new(Self::COLLABORATOR)
    }

    pub fn default_manager() -> Self {
        Self::new(Self::DEFAULT_MANAGER)
    }

    /// Normalise a stored value: null or blank becomes the default manager role.
    pub fn or_default(raw: Option<String>) -> Self {
        match raw {
            Some(r) if !r.trim().is_empty() => Self::new(r),
            _ => Self::default_manager(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn capability(&self) -> Capability {
        classify(Some(self.as_str()))
    }

    /// True for the four manager roles the product defines (audit only; the
    /// classifier treats unknown roles as managers too).
    pub fn is_known_manager_role(&self) -> bool {
        Self::KNOWN_MANAGER_ROLES.contains(&self.as_str())
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability class derived from a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Tenant owner/operator with full administrative rights.
    Manager,
    /// Worker scoped to tenants it was admitted to.
    Collaborator,
}

/// Map a raw role to its capability class.
///
/// Total and exhaustive: exactly `"colaborador"` is a collaborator, every
/// other value (including null and unknown strings) is a manager.
pub fn classify(role: Option<&str>) -> Capability {
    match role {
        Some(Role::COLLABORATOR) => Capability::Collaborator,
        _ => Capability::Manager,
    }
}

pub fn is_manager(role: Option<&str>) -> bool {
    classify(role) == Capability::Manager
}

pub fn is_collaborator(role: Option<&str>) -> bool {
    classify(role) == Capability::Collaborator
}
