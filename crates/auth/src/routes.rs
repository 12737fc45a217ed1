//! Route vocabulary shared by the guard and the onboarding router.

use serde::{Deserialize, Serialize};

pub const LOGIN: &str = "/login";
pub const DASHBOARD: &str = "/dashboard";
pub const SELECT_TENANT: &str = "/selecionar-condominio";
pub const AWAITING_APPROVAL: &str = "/aguardando-aprovacao";
pub const ONBOARDING: &str = "/onboarding";

/// Capability a route declares it needs (the route's `requiredRole`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteRequirement {
    /// Any signed-in user that passes admission checks.
    #[default]
    Any,
    /// Manager-only route.
    Manager,
}

/// One-time post-sign-in destination for brand-new accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    SelectTenant,
    Onboarding,
}

impl Destination {
    pub fn path(&self) -> &'static str {
        match self {
            Destination::SelectTenant => SELECT_TENANT,
            Destination::Onboarding => ONBOARDING,
        }
    }
}

/// Paths and filters the guard evaluates.
///
/// Defaults match the product's routes; deployments may override them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutePolicy {
    pub login: String,
    pub fallback: String,
    pub select_tenant: String,
    pub awaiting_approval: String,
    /// Path prefixes collaborators may never open.
    pub admin_prefixes: Vec<String>,
    /// Marker identifying tenant-detail management paths.
    pub tenant_path_marker: String,
    /// Tenant-detail sub-paths collaborators may open.
    pub collaborator_tenant_suffixes: Vec<String>,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            login: LOGIN.to_string(),
            fallback: DASHBOARD.to_string(),
            select_tenant: SELECT_TENANT.to_string(),
            awaiting_approval: AWAITING_APPROVAL.to_string(),
            admin_prefixes: ["/ia", "/configuracoes", "/admin", ONBOARDING]
                .into_iter()
                .map(String::from)
                .collect(),
            tenant_path_marker: "/condominios/".to_string(),
            collaborator_tenant_suffixes: vec!["/checkin".to_string(), "/obrigacoes".to_string()],
        }
    }
}

impl RoutePolicy {
    pub fn is_admin_page(&self, path: &str) -> bool {
        self.admin_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    /// A tenant-detail path other than the collaborator-permitted sub-paths.
    pub fn is_restricted_tenant_path(&self, path: &str) -> bool {
        path.contains(self.tenant_path_marker.as_str())
            && !self
                .collaborator_tenant_suffixes
                .iter()
                .any(|s| path.ends_with(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_pages_match_by_prefix() {
        let policy = RoutePolicy::default();
        assert!(policy.is_admin_page("/ia"));
        assert!(policy.is_admin_page("/configuracoes/perfil"));
        assert!(policy.is_admin_page("/onboarding"));
        assert!(!policy.is_admin_page("/dashboard"));
    }

    #[test]
    fn tenant_paths_allow_only_checkin_and_obligations() {
        let policy = RoutePolicy::default();
        assert!(policy.is_restricted_tenant_path("/condominios/123/equipe"));
        assert!(policy.is_restricted_tenant_path("/condominios/123"));
        assert!(!policy.is_restricted_tenant_path("/condominios/123/checkin"));
        assert!(!policy.is_restricted_tenant_path("/condominios/123/obrigacoes"));
        assert!(!policy.is_restricted_tenant_path("/condominios"));
    }

    #[test]
    fn partial_policy_json_keeps_defaults() {
        let policy: RoutePolicy = serde_json::from_str(r#"{"admin_prefixes":["/ia"]}"#).unwrap();
        assert_eq!(policy.admin_prefixes, vec!["/ia".to_string()]);
        assert_eq!(policy.login, LOGIN);
    }

    #[test]
    fn destinations_map_to_paths() {
        assert_eq!(Destination::SelectTenant.path(), "/selecionar-condominio");
        assert_eq!(Destination::Onboarding.path(), "/onboarding");
    }
}
