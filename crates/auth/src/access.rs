//! Tenant admission records for collaborators.
//!
//! A collaborator requests access to a tenant; a manager who owns that tenant
//! approves or rejects the request. Settled records are never reopened by the
//! core. Deleting a record returns the collaborator to "no record".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatehouse_core::{AccessRecordId, DomainError, DomainResult, TenantId, UserId};

use crate::profile::Profile;

/// Admission status. Wire values follow the data store (`pendente`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessStatus {
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "aprovado")]
    Approved,
    #[serde(rename = "recusado")]
    Rejected,
}

impl AccessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessStatus::Pending => "pendente",
            AccessStatus::Approved => "aprovado",
            AccessStatus::Rejected => "recusado",
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, AccessStatus::Approved)
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, AccessStatus::Pending)
    }
}

impl core::fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for AccessStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendente" => Ok(AccessStatus::Pending),
            "aprovado" => Ok(AccessStatus::Approved),
            "recusado" => Ok(AccessStatus::Rejected),
            other => Err(DomainError::validation(format!("unknown access status '{other}'"))),
        }
    }
}

/// Free-form access level label (`nivel_acesso`), stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessLevel(String);

impl AccessLevel {
    pub fn new(level: impl Into<String>) -> Self {
        Self(level.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Which user owns a tenant. Only the owner may settle admissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantOwnership {
    pub tenant_id: TenantId,
    pub owner_id: UserId,
}

/// Admission of one collaborator to one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub id: AccessRecordId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub status: AccessStatus,
    #[serde(rename = "colaborador_nome")]
    pub collaborator_name: Option<String>,
    #[serde(rename = "nivel_acesso")]
    pub access_level: Option<AccessLevel>,
    pub created_at: DateTime<Utc>,
}

impl AccessRecord {
    /// Open a pending request from a collaborator.
    pub fn request(requester: &Profile, tenant_id: TenantId, now: DateTime<Utc>) -> DomainResult<Self> {
        if !requester.is_collaborator() {
            return Err(DomainError::validation("only collaborators request tenant access"));
        }

        let name = requester.full_name.trim();
        Ok(Self {
            id: AccessRecordId::new(),
            tenant_id,
            user_id: requester.id,
            status: AccessStatus::Pending,
            collaborator_name: (!name.is_empty()).then(|| name.to_string()),
            access_level: None,
            created_at: now,
        })
    }

    pub fn approve(&mut self, actor: &Profile, tenant: &TenantOwnership) -> DomainResult<()> {
        self.settle(actor, tenant, AccessStatus::Approved)
    }

    pub fn reject(&mut self, actor: &Profile, tenant: &TenantOwnership) -> DomainResult<()> {
        self.settle(actor, tenant, AccessStatus::Rejected)
    }

    /// Check that `actor` may delete this record (any status).
    pub fn ensure_removable_by(&self, actor: &Profile, tenant: &TenantOwnership) -> DomainResult<()> {
        self.ensure_owner(actor, tenant)
    }

    /// Set the access level label on an approved record.
    pub fn grant_level(
        &mut self,
        actor: &Profile,
        tenant: &TenantOwnership,
        level: AccessLevel,
    ) -> DomainResult<()> {
        self.ensure_owner(actor, tenant)?;
        if !self.status.is_approved() {
            return Err(DomainError::invariant("access level requires an approved record"));
        }
        self.access_level = Some(level);
        Ok(())
    }

    fn settle(&mut self, actor: &Profile, tenant: &TenantOwnership, to: AccessStatus) -> DomainResult<()> {
        self.ensure_owner(actor, tenant)?;
        if self.status.is_settled() {
            return Err(DomainError::invariant(format!(
                "access record already {}",
                self.status
            )));
        }
        self.status = to;
        Ok(())
    }

    fn ensure_owner(&self, actor: &Profile, tenant: &TenantOwnership) -> DomainResult<()> {
        if tenant.tenant_id != self.tenant_id {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if !actor.is_manager() || actor.id != tenant.owner_id {
            return Err(DomainError::Unauthorized);
        }
        Ok(())
    }
}

/// A tenant's admission records split by status, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamRoster {
    pub pending: Vec<AccessRecord>,
    pub approved: Vec<AccessRecord>,
    pub rejected: Vec<AccessRecord>,
}

impl TeamRoster {
    pub fn from_records(records: impl IntoIterator<Item = AccessRecord>) -> Self {
        let mut records: Vec<AccessRecord> = records.into_iter().collect();
        records.sort_by_key(|r| r.created_at);

        let mut roster = Self::default();
        for r in records {
            match r.status {
                AccessStatus::Pending => roster.pending.push(r),
                AccessStatus::Approved => roster.approved.push(r),
                AccessStatus::Rejected => roster.rejected.push(r),
            }
        }
        roster
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::roles::Role;

    fn profile(role: &'static str, name: &str) -> Profile {
        Profile {
            id: UserId::new(),
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            avatar_url: None,
            role: Role::new(role),
        }
    }

    fn setup() -> (Profile, Profile, TenantOwnership, AccessRecord) {
        let owner = profile("sindico", "Olga");
        let worker = profile("colaborador", "Wagner");
        let tenant = TenantOwnership {
            tenant_id: TenantId::new(),
            owner_id: owner.id,
        };
        let record = AccessRecord::request(&worker, tenant.tenant_id, Utc::now()).unwrap();
        (owner, worker, tenant, record)
    }

    #[test]
    fn request_opens_pending_record_with_name() {
        let (_, worker, tenant, record) = setup();
        assert_eq!(record.status, AccessStatus::Pending);
        assert_eq!(record.user_id, worker.id);
        assert_eq!(record.tenant_id, tenant.tenant_id);
        assert_eq!(record.collaborator_name.as_deref(), Some("Wagner"));
    }

    #[test]
    fn managers_cannot_request_access() {
        let owner = profile("sindico", "Olga");
        let err = AccessRecord::request(&owner, TenantId::new(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn owner_approves_pending_record() {
        let (owner, _, tenant, mut record) = setup();
        record.approve(&owner, &tenant).unwrap();
        assert_eq!(record.status, AccessStatus::Approved);
    }

    #[test]
    fn owner_rejects_pending_record() {
        let (owner, _, tenant, mut record) = setup();
        record.reject(&owner, &tenant).unwrap();
        assert_eq!(record.status, AccessStatus::Rejected);
    }

    #[test]
    fn settled_records_are_not_reopened() {
        let (owner, _, tenant, mut record) = setup();
        record.reject(&owner, &tenant).unwrap();

        let err = record.approve(&owner, &tenant).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(record.status, AccessStatus::Rejected);
    }

    #[test]
    fn manager_of_another_tenant_is_unauthorized() {
        let (_, _, tenant, mut record) = setup();
        let stranger = profile("sindico", "Sergio");
        assert_eq!(record.approve(&stranger, &tenant), Err(DomainError::Unauthorized));
        assert_eq!(record.ensure_removable_by(&stranger, &tenant), Err(DomainError::Unauthorized));
    }

    #[test]
    fn collaborator_cannot_approve_itself() {
        let (owner, worker, _, mut record) = setup();
        let forged = TenantOwnership {
            tenant_id: record.tenant_id,
            owner_id: worker.id,
        };
        assert_eq!(record.approve(&worker, &forged), Err(DomainError::Unauthorized));
        assert_ne!(owner.id, worker.id);
    }

    #[test]
    fn ownership_of_wrong_tenant_is_rejected() {
        let (owner, _, _, mut record) = setup();
        let other = TenantOwnership {
            tenant_id: TenantId::new(),
            owner_id: owner.id,
        };
        assert!(matches!(
            record.approve(&owner, &other),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn access_level_needs_approval() {
        let (owner, _, tenant, mut record) = setup();
        assert!(record.grant_level(&owner, &tenant, AccessLevel::new("portaria")).is_err());

        record.approve(&owner, &tenant).unwrap();
        record.grant_level(&owner, &tenant, AccessLevel::new("portaria")).unwrap();
        assert_eq!(record.access_level.as_ref().map(AccessLevel::as_str), Some("portaria"));
    }

    #[test]
    fn status_uses_store_wire_values() {
        let json = serde_json::to_string(&AccessStatus::Approved).unwrap();
        assert_eq!(json, "\"aprovado\"");
        assert_eq!("recusado".parse::<AccessStatus>().unwrap(), AccessStatus::Rejected);
        assert!("approved".parse::<AccessStatus>().is_err());
    }

    #[test]
    fn roster_partitions_by_status_oldest_first() {
        let (owner, _, tenant, mut approved) = setup();
        approved.approve(&owner, &tenant).unwrap();

        let late = profile("colaborador", "Lia");
        let mut pending_late = AccessRecord::request(&late, tenant.tenant_id, Utc::now()).unwrap();
        pending_late.created_at = approved.created_at + Duration::minutes(5);
        let early = profile("colaborador", "Edu");
        let mut pending_early = AccessRecord::request(&early, tenant.tenant_id, Utc::now()).unwrap();
        pending_early.created_at = approved.created_at - Duration::minutes(5);

        let roster = TeamRoster::from_records(vec![pending_late, approved, pending_early]);
        assert_eq!(roster.approved.len(), 1);
        assert_eq!(roster.pending.len(), 2);
        assert_eq!(roster.pending[0].collaborator_name.as_deref(), Some("Edu"));
        assert!(roster.rejected.is_empty());
    }
}
