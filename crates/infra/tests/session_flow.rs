//! End-to-end flows: provider event → session snapshot → route guard, using
//! the in-memory adapters.

use std::sync::Arc;

use chrono::{Duration, Utc};

use gatehouse_auth::{
    AccessToken, Destination, GuardDecision, GuardRule, IdentityEvent, PendingRoleMarker, Role, RouteRequirement,
    Session, SessionUser, UserMetadata,
};
use gatehouse_core::{TenantId, UserId};
use gatehouse_infra::store::{
    InMemoryAccessRecordStore, InMemoryMarkerStore, InMemoryProfileStore, InMemoryTenantDirectory,
    JsonFileMarkerStore, MarkerStore, ProfileStore,
};
use gatehouse_infra::{AccessGate, GatehouseConfig, InMemoryIdentityProvider, Ports, SessionStore, TeamService};

struct World {
    provider: Arc<InMemoryIdentityProvider>,
    profiles: Arc<InMemoryProfileStore>,
    records: Arc<InMemoryAccessRecordStore>,
    tenants: Arc<InMemoryTenantDirectory>,
    markers: Arc<dyn MarkerStore>,
}

impl World {
    fn new() -> Self {
        Self::with_markers(InMemoryMarkerStore::arc())
    }

    fn with_markers(markers: Arc<dyn MarkerStore>) -> Self {
        Self {
            provider: Arc::new(InMemoryIdentityProvider::new()),
            profiles: InMemoryProfileStore::arc(),
            records: InMemoryAccessRecordStore::arc(),
            tenants: InMemoryTenantDirectory::arc(),
            markers,
        }
    }

    fn ports(&self) -> Ports {
        Ports {
            provider: self.provider.clone(),
            profiles: self.profiles.clone(),
            records: self.records.clone(),
            tenants: self.tenants.clone(),
            markers: self.markers.clone(),
        }
    }

    fn store(&self) -> SessionStore {
        self.ports().session_store(&GatehouseConfig::default())
    }

    fn gate(&self) -> AccessGate<Arc<InMemoryAccessRecordStore>> {
        AccessGate::new(self.records.clone())
    }
}

fn session(token: &str, age: Duration) -> Session {
    Session {
        access_token: AccessToken::new(token),
        refresh_token: Some(AccessToken::new(format!("{token}-refresh"))),
        expires_at: Some(Utc::now() + Duration::hours(1)),
        user: SessionUser {
            id: UserId::new(),
            email: Some("flow@example.com".into()),
            created_at: Utc::now() - age,
            user_metadata: UserMetadata {
                full_name: Some("Flávia".into()),
                ..UserMetadata::default()
            },
        },
    }
}

fn redirect(to: &str) -> GuardDecision {
    GuardDecision::Redirect(to.to_string())
}

#[tokio::test]
async fn guard_waits_until_the_startup_check_completes() {
    let world = World::new();
    let store = world.store();
    let gate = world.gate();

    let before = store.snapshot();
    assert_eq!(
        gate.check(&before, "/dashboard", RouteRequirement::Any, None).await,
        GuardDecision::Wait
    );

    let (handle, _destinations) = store.spawn();
    let settled = handle.settled().await.unwrap();
    assert_eq!(
        gate.check(&settled, "/dashboard", RouteRequirement::Any, None).await,
        redirect("/login")
    );
}

#[tokio::test]
async fn oauth_collaborator_journey() {
    let dir = tempfile::tempdir().unwrap();
    let marker_path = dir.path().join("pending_role.json");

    // Role chosen on the sign-up form, before the OAuth redirect.
    JsonFileMarkerStore::new(&marker_path)
        .set(PendingRoleMarker::new(Role::collaborator()))
        .await
        .unwrap();

    // A fresh process after the redirect reopens the same file.
    let world = World::with_markers(Arc::new(JsonFileMarkerStore::new(&marker_path)));
    let owner = UserId::new();
    let tenant = TenantId::new();
    world.tenants.add_tenant(tenant, owner);

    let (handle, mut destinations) = world.store().spawn();
    handle.settled().await.unwrap();

    let s = session("oauth", Duration::seconds(4));
    let user_id = s.user_id();
    let destination = handle.send(IdentityEvent::SignedIn(s.clone())).await.unwrap();
    assert_eq!(destination, Some(Destination::SelectTenant));
    assert_eq!(destinations.recv().await, Some(Destination::SelectTenant));
    assert!(!marker_path.exists());

    let snap = handle.snapshot();
    assert!(snap.is_collaborator());
    assert_eq!(world.profiles.row(user_id).unwrap().role.as_deref(), Some("colaborador"));

    let gate = world.gate();
    assert_eq!(
        gate.check(&snap, "/dashboard", RouteRequirement::Any, None).await,
        redirect("/selecionar-condominio")
    );

    let team = TeamService::new(world.records.clone(), world.tenants.clone());
    let profile = snap.profile.clone().unwrap();
    let record = team.request_access(&profile, tenant, Utc::now()).await.unwrap();

    let pending = gate.explain(&snap, "/dashboard", RouteRequirement::Any, Some(tenant)).await;
    assert_eq!(pending.rule, GuardRule::AccessNotApproved);
    assert_eq!(pending.decision, redirect("/aguardando-aprovacao"));

    let mut manager = profile.clone();
    manager.id = owner;
    manager.role = Role::default_manager();
    team.approve(&manager, record.id).await.unwrap();

    assert_eq!(
        gate.check(&snap, "/condominios/123/checkin", RouteRequirement::Any, Some(tenant)).await,
        GuardDecision::Allow
    );
    assert_eq!(
        gate.check(&snap, "/condominios/123/equipe", RouteRequirement::Any, Some(tenant)).await,
        redirect("/dashboard")
    );
    assert_eq!(
        gate.check(&snap, "/configuracoes", RouteRequirement::Any, Some(tenant)).await,
        redirect("/dashboard")
    );

    // Duplicate delivery of the same sign-in: no second destination.
    assert_eq!(handle.send(IdentityEvent::SignedIn(s)).await.unwrap(), None);

    team.remove(&manager, record.id).await.unwrap();
    assert_eq!(
        gate.check(&snap, "/dashboard", RouteRequirement::Any, None).await,
        redirect("/selecionar-condominio")
    );
}

#[tokio::test]
async fn new_sindico_is_sent_to_onboarding_once() {
    let world = World::new();
    let (handle, _destinations) = world.store().spawn();
    handle.settled().await.unwrap();

    let s = session("fresh", Duration::seconds(5));
    assert_eq!(
        handle.send(IdentityEvent::SignedIn(s.clone())).await.unwrap(),
        Some(Destination::Onboarding)
    );
    assert!(handle.snapshot().is_manager());

    let gate = world.gate();
    assert_eq!(
        gate.check(&handle.snapshot(), "/onboarding", RouteRequirement::Manager, None).await,
        GuardDecision::Allow
    );

    // Profile creation was idempotent across the duplicate delivery.
    assert_eq!(handle.send(IdentityEvent::SignedIn(s)).await.unwrap(), None);
    assert_eq!(world.profiles.len(), 1);
}

#[tokio::test]
async fn new_sindico_with_a_tenant_and_returning_users_are_not_routed() {
    let world = World::new();
    let (handle, _destinations) = world.store().spawn();
    handle.settled().await.unwrap();

    let fresh = session("a", Duration::seconds(5));
    world.tenants.add_tenant(TenantId::new(), fresh.user_id());
    assert_eq!(handle.send(IdentityEvent::SignedIn(fresh)).await.unwrap(), None);

    handle.send(IdentityEvent::SignedOut).await.unwrap();
    let returning = session("b", Duration::days(200));
    assert_eq!(handle.send(IdentityEvent::SignedIn(returning)).await.unwrap(), None);
}

#[tokio::test]
async fn token_refresh_without_prior_session_signs_in() {
    let world = World::new();
    let (handle, _destinations) = world.store().spawn();
    handle.settled().await.unwrap();

    assert_eq!(handle.send(IdentityEvent::TokenRefreshed(None)).await.unwrap(), None);
    assert!(handle.snapshot().session.is_none());

    let s = session("late", Duration::days(10));
    handle.send(IdentityEvent::TokenRefreshed(Some(s.clone()))).await.unwrap();
    let snap = handle.snapshot();
    assert_eq!(snap.user_id(), Some(s.user_id()));
    assert!(snap.profile.is_some());
    assert!(world.profiles.find(s.user_id()).await.unwrap().is_some());
}

#[tokio::test]
async fn sign_out_returns_every_page_to_login() {
    let world = World::new();
    let s = session("live", Duration::days(30));
    world.provider.set_session(Some(s));

    let (handle, _destinations) = world.store().spawn();
    let snap = handle.settled().await.unwrap();
    assert!(snap.is_manager());

    handle.sign_out().await.unwrap();
    let gate = world.gate();
    for path in ["/dashboard", "/ia", "/condominios/1/checkin"] {
        assert_eq!(
            gate.check(&handle.snapshot(), path, RouteRequirement::Any, None).await,
            redirect("/login"),
            "{path}"
        );
    }
    assert_eq!(world.provider.sign_out_count(), 1);
}
