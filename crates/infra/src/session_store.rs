//! Process-wide session/profile cache driven by identity-provider events.
//!
//! `SessionStore` is a single-owner state machine: every handler takes
//! `&mut self` and runs to completion before the next one starts. `spawn`
//! moves it into a tokio task that consumes commands in delivery order and
//! publishes immutable [`SessionSnapshot`]s over a `watch` channel.
//!
//! ```text
//! IdentityEvent ──► SessionHandle::send ──► actor ──► PendingRoleApplier
//!                                                 ──► ProfileResolver
//!                                                 ──► watch<SessionSnapshot>
//!                                                 ──► NewAccountRouter ──► mpsc<Destination>
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, instrument, warn};

use gatehouse_auth::{Destination, IdentityEvent, Profile, Session};
use gatehouse_core::UserId;

use crate::identity::{IdentityProvider, ProviderError};
use crate::services::{NewAccountRouter, PendingRoleApplier, ProfileResolver};
use crate::store::{MarkerStore, ProfileStore, TenantDirectory};

/// Immutable view of the session state at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub session: Option<Session>,
    pub profile: Option<Profile>,
    pub loading: bool,
}

impl SessionSnapshot {
    /// State before the startup check completes.
    pub fn initial() -> Self {
        Self {
            session: None,
            profile: None,
            loading: true,
        }
    }

    fn signed_out() -> Self {
        Self {
            session: None,
            profile: None,
            loading: false,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.session.as_ref().map(Session::user_id)
    }

    /// False while loading or without a profile.
    pub fn is_manager(&self) -> bool {
        !self.loading && self.profile.as_ref().is_some_and(Profile::is_manager)
    }

    /// False while loading or without a profile.
    pub fn is_collaborator(&self) -> bool {
        !self.loading && self.profile.as_ref().is_some_and(Profile::is_collaborator)
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session store is no longer running")]
    Closed,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

type Profiles = Arc<dyn ProfileStore>;

pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    resolver: ProfileResolver<Profiles>,
    applier: PendingRoleApplier<Arc<dyn MarkerStore>, Profiles>,
    router: NewAccountRouter<Arc<dyn TenantDirectory>>,
    state: SessionSnapshot,
    snapshots: watch::Sender<SessionSnapshot>,
    /// User already routed during the current sign-in.
    routed: Option<UserId>,
    initialized: bool,
}

impl SessionStore {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        markers: Arc<dyn MarkerStore>,
        tenants: Arc<dyn TenantDirectory>,
    ) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::initial());
        Self {
            provider,
            resolver: ProfileResolver::new(profiles.clone()),
            applier: PendingRoleApplier::new(markers, profiles),
            router: NewAccountRouter::new(tenants),
            state: SessionSnapshot::initial(),
            snapshots,
            routed: None,
            initialized: false,
        }
    }

    pub fn with_new_account_window(mut self, window: Duration) -> Self {
        self.router = self.router.with_window(window);
        self
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    /// One-time startup check. Never routes and never applies a pending role.
    #[instrument(skip(self))]
    pub async fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let session = match self.provider.get_session().await {
            Ok(session) => session,
            Err(error) => {
                warn!(error = %error, operation = "get_session", "startup check failed; starting signed out");
                None
            }
        };

        let profile = match &session {
            Some(s) => Some(self.resolver.resolve(&s.user).await),
            None => None,
        };

        debug!(signed_in = session.is_some(), "startup check complete");
        self.publish(SessionSnapshot {
            session,
            profile,
            loading: false,
        });
    }

    /// Apply one provider event. Returns the one-time destination for a
    /// brand-new account, if any.
    #[instrument(skip(self, event), fields(event = event.kind()))]
    pub async fn handle(&mut self, event: IdentityEvent) -> Option<Destination> {
        match event {
            IdentityEvent::SignedIn(session) => self.sign_in(session).await,
            // A refresh for a user other than the current one must not keep
            // the previous user's profile.
            IdentityEvent::TokenRefreshed(Some(session)) if self.state.user_id() != Some(session.user_id()) => {
                info!(
                    user_id = %session.user_id(),
                    previous = ?self.state.user_id(),
                    "token refreshed for a different user; treating as sign-in"
                );
                self.sign_in(session).await
            }
            IdentityEvent::TokenRefreshed(Some(session)) => {
                let mut next = self.state.clone();
                next.session = Some(session);
                self.publish(next);
                None
            }
            IdentityEvent::TokenRefreshed(None) => {
                debug!("token refreshed without payload; ignored");
                None
            }
            IdentityEvent::SignedOut => {
                if let Some(user_id) = self.state.user_id() {
                    info!(user_id = %user_id, "signed out");
                }
                self.routed = None;
                self.publish(SessionSnapshot::signed_out());
                None
            }
        }
    }

    /// Re-resolve the profile for the current session.
    pub async fn refresh_profile(&mut self) -> Option<Profile> {
        let session = self.state.session.clone()?;
        let profile = self.resolver.resolve(&session.user).await;
        let mut next = self.state.clone();
        next.profile = Some(profile.clone());
        self.publish(next);
        Some(profile)
    }

    /// Ask the provider to end the session, then clear local state even if
    /// the provider call failed.
    pub async fn sign_out(&mut self) -> Result<(), ProviderError> {
        let result = self.provider.sign_out().await;
        if let Err(error) = &result {
            warn!(error = %error, operation = "sign_out", "provider sign-out failed; clearing local session");
        }
        self.handle(IdentityEvent::SignedOut).await;
        result
    }

    async fn sign_in(&mut self, session: Session) -> Option<Destination> {
        let user = session.user.clone();

        // Default-deny while the profile resolves.
        self.publish(SessionSnapshot {
            session: Some(session.clone()),
            profile: self.state.profile.clone().filter(|p| p.id == user.id),
            loading: true,
        });

        self.applier.apply_if_present(&user).await;
        let profile = self.resolver.resolve(&user).await;
        info!(user_id = %user.id, role = %profile.role, "signed in");

        self.publish(SessionSnapshot {
            session: Some(session),
            profile: Some(profile.clone()),
            loading: false,
        });

        if self.routed == Some(user.id) {
            debug!(user_id = %user.id, "sign-in already routed");
            return None;
        }
        self.routed = Some(user.id);
        self.router.decide(&user, &profile, Utc::now()).await
    }

    fn publish(&mut self, next: SessionSnapshot) {
        self.state = next;
        self.snapshots.send_replace(self.state.clone());
    }

    /// Move the store into a background task.
    ///
    /// Returns the command handle and the receiver of one-time destinations.
    /// The task stops once every handle has been dropped.
    pub fn spawn(mut self) -> (SessionHandle, mpsc::UnboundedReceiver<Destination>) {
        let (commands, mut inbox) = mpsc::unbounded_channel::<Command>();
        let (destinations, destination_rx) = mpsc::unbounded_channel();
        let snapshots = self.subscribe();

        tokio::spawn(async move {
            self.initialize().await;
            while let Some(command) = inbox.recv().await {
                match command {
                    Command::Event(event, ack) => {
                        let destination = self.handle(event).await;
                        if let Some(destination) = destination {
                            let _ = destinations.send(destination);
                        }
                        let _ = ack.send(destination);
                    }
                    Command::RefreshProfile(ack) => {
                        let _ = ack.send(self.refresh_profile().await);
                    }
                    Command::SignOut(ack) => {
                        let _ = ack.send(self.sign_out().await);
                    }
                }
            }
            debug!("session store stopped");
        });

        (SessionHandle { commands, snapshots }, destination_rx)
    }
}

enum Command {
    Event(IdentityEvent, oneshot::Sender<Option<Destination>>),
    RefreshProfile(oneshot::Sender<Option<Profile>>),
    SignOut(oneshot::Sender<Result<(), ProviderError>>),
}

/// Cloneable handle onto a spawned [`SessionStore`].
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Deliver a provider event and wait until it has been applied.
    pub async fn send(&self, event: IdentityEvent) -> Result<Option<Destination>, SessionError> {
        let (ack, done) = oneshot::channel();
        self.commands
            .send(Command::Event(event, ack))
            .map_err(|_| SessionError::Closed)?;
        done.await.map_err(|_| SessionError::Closed)
    }

    pub async fn refresh_profile(&self) -> Result<Option<Profile>, SessionError> {
        let (ack, done) = oneshot::channel();
        self.commands
            .send(Command::RefreshProfile(ack))
            .map_err(|_| SessionError::Closed)?;
        done.await.map_err(|_| SessionError::Closed)
    }

    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let (ack, done) = oneshot::channel();
        self.commands
            .send(Command::SignOut(ack))
            .map_err(|_| SessionError::Closed)?;
        Ok(done.await.map_err(|_| SessionError::Closed)??)
    }

    /// Wait until the store is no longer loading.
    pub async fn settled(&self) -> Result<SessionSnapshot, SessionError> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(|s| !s.loading)
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok(snapshot.clone())
    }
}
