//! Route guard: classifies every navigation as wait, allow or redirect.
//!
//! Rules are evaluated in a fixed order and the first match wins. Identity and
//! admission checks run before capability checks so that an unapproved
//! collaborator never reaches role-based rules.
//!
//! - No IO
//! - No panics
//! - Denial is a redirect, never an error

use serde::Serialize;

use crate::access::AccessStatus;
use crate::profile::Profile;
use crate::roles::Capability;
use crate::routes::{RoutePolicy, RouteRequirement};
use crate::session::Session;

/// State of the collaborator's access-record lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLookup {
    /// The lookup is in flight.
    Loading,
    /// No record exists for the user (in the current tenant context).
    Missing,
    Found(AccessStatus),
}

/// Everything the guard needs for one navigation.
#[derive(Debug, Clone, Copy)]
pub struct GuardInput<'a> {
    pub path: &'a str,
    pub requirement: RouteRequirement,
    pub session: Option<&'a Session>,
    pub profile: Option<&'a Profile>,
    /// Session/profile resolution still running.
    pub loading: bool,
    pub access: AccessLookup,
}

impl GuardInput<'_> {
    /// Capability flags default to "none" while loading or without a profile.
    fn capability(&self) -> Option<Capability> {
        if self.loading {
            return None;
        }
        self.profile.map(Profile::capability)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "target", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Render a neutral waiting state; no decision yet.
    Wait,
    Allow,
    Redirect(String),
}

impl GuardDecision {
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GuardDecision::Redirect(t) => Some(t),
            _ => None,
        }
    }
}

/// The rule that produced a decision, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardRule {
    Loading,
    NoSession,
    NoAccessRecord,
    AccessNotApproved,
    ManagerRequired,
    AdminPage,
    TenantManagementPage,
    Allowed,
}

/// Auditable explanation of a guard decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardExplanation {
    pub path: String,
    pub rule: GuardRule,
    pub decision: GuardDecision,
    pub capability: Option<Capability>,
    pub reason: String,
}

/// Decide a navigation.
pub fn guard(input: &GuardInput<'_>, policy: &RoutePolicy) -> GuardDecision {
    explain(input, policy).decision
}

/// Decide a navigation and say which rule matched.
pub fn explain(input: &GuardInput<'_>, policy: &RoutePolicy) -> GuardExplanation {
    let capability = input.capability();
    let is_collaborator = capability == Some(Capability::Collaborator);
    let is_manager = capability == Some(Capability::Manager);
    let path = input.path;
    let unapproved = match input.access {
        AccessLookup::Found(status) if is_collaborator && !status.is_approved() => Some(status),
        _ => None,
    };

    let (rule, decision, reason) = if input.loading || (is_collaborator && input.access == AccessLookup::Loading) {
        (
            GuardRule::Loading,
            GuardDecision::Wait,
            "session or access lookup still resolving".to_string(),
        )
    } else if input.session.is_none() {
        (
            GuardRule::NoSession,
            GuardDecision::Redirect(policy.login.clone()),
            "no active session".to_string(),
        )
    } else if is_collaborator && input.access == AccessLookup::Missing && path != policy.select_tenant {
        (
            GuardRule::NoAccessRecord,
            GuardDecision::Redirect(policy.select_tenant.clone()),
            "collaborator has not requested access to a tenant".to_string(),
        )
    } else if let Some(status) = unapproved.filter(|_| path != policy.awaiting_approval) {
        (
            GuardRule::AccessNotApproved,
            GuardDecision::Redirect(policy.awaiting_approval.clone()),
            format!("collaborator access is {status}"),
        )
    } else if input.requirement == RouteRequirement::Manager && !is_manager {
        (
            GuardRule::ManagerRequired,
            GuardDecision::Redirect(policy.fallback.clone()),
            "route requires a manager".to_string(),
        )
    } else if is_collaborator && policy.is_admin_page(path) {
        (
            GuardRule::AdminPage,
            GuardDecision::Redirect(policy.fallback.clone()),
            "administrative page is closed to collaborators".to_string(),
        )
    } else if is_collaborator && policy.is_restricted_tenant_path(path) {
        (
            GuardRule::TenantManagementPage,
            GuardDecision::Redirect(policy.fallback.clone()),
            "tenant management page is closed to collaborators".to_string(),
        )
    } else {
        (GuardRule::Allowed, GuardDecision::Allow, "all checks passed".to_string())
    };

    GuardExplanation {
        path: path.to_string(),
        rule,
        decision,
        capability,
        reason,
    }
}
