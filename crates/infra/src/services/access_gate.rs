use tracing::{debug, info, warn};

use gatehouse_auth::guard::{self, AccessLookup, GuardDecision, GuardExplanation, GuardInput};
use gatehouse_auth::{RoutePolicy, RouteRequirement};
use gatehouse_core::TenantId;

use crate::session_store::SessionSnapshot;
use crate::store::AccessRecordStore;

/// Route guard over a session snapshot plus the collaborator's admission
/// record.
#[derive(Debug, Clone)]
pub struct AccessGate<A> {
    records: A,
    policy: RoutePolicy,
}

impl<A: AccessRecordStore> AccessGate<A> {
    pub fn new(records: A) -> Self {
        Self::with_policy(records, RoutePolicy::default())
    }

    pub fn with_policy(records: A, policy: RoutePolicy) -> Self {
        Self { records, policy }
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    /// Admission state for the snapshot's user.
    ///
    /// Only collaborators are looked up. A failed lookup counts as "no
    /// record", which sends the collaborator to tenant selection.
    pub async fn lookup_for(&self, snapshot: &SessionSnapshot, tenant: Option<TenantId>) -> AccessLookup {
        if snapshot.loading {
            return AccessLookup::Loading;
        }
        let Some(user_id) = snapshot.user_id() else {
            return AccessLookup::Missing;
        };
        if !snapshot.is_collaborator() {
            return AccessLookup::Missing;
        }

        match self.records.find_for_user(user_id, tenant).await {
            Ok(Some(record)) => AccessLookup::Found(record.status),
            Ok(None) => AccessLookup::Missing,
            Err(error) => {
                warn!(user_id = %user_id, error = %error, operation = "find_access_for_user", "access lookup failed; treating as no record");
                AccessLookup::Missing
            }
        }
    }

    /// Decide with a lookup state the caller already holds.
    pub fn decide(
        &self,
        snapshot: &SessionSnapshot,
        path: &str,
        requirement: RouteRequirement,
        access: AccessLookup,
    ) -> GuardExplanation {
        let input = GuardInput {
            path,
            requirement,
            session: snapshot.session.as_ref(),
            profile: snapshot.profile.as_ref(),
            loading: snapshot.loading,
            access,
        };
        let explanation = guard::explain(&input, &self.policy);

        match &explanation.decision {
            GuardDecision::Allow => {}
            GuardDecision::Wait => debug!(path, "navigation waiting"),
            GuardDecision::Redirect(target) => info!(
                user_id = ?snapshot.user_id(),
                path,
                rule = ?explanation.rule,
                target = %target,
                "navigation redirected"
            ),
        }
        explanation
    }

    pub async fn explain(
        &self,
        snapshot: &SessionSnapshot,
        path: &str,
        requirement: RouteRequirement,
        tenant: Option<TenantId>,
    ) -> GuardExplanation {
        let access = self.lookup_for(snapshot, tenant).await;
        self.decide(snapshot, path, requirement, access)
    }

    pub async fn check(
        &self,
        snapshot: &SessionSnapshot,
        path: &str,
        requirement: RouteRequirement,
        tenant: Option<TenantId>,
    ) -> GuardDecision {
        self.explain(snapshot, path, requirement, tenant).await.decision
    }
}
