//! Identity provider port.
//!
//! The provider issues and refreshes sessions; lifecycle events reach the
//! session store through [`crate::session_store::SessionHandle::send`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use gatehouse_auth::Session;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current session, if any. Used for the one-time startup check.
    async fn get_session(&self) -> Result<Option<Session>, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;
}

#[async_trait]
impl<S> IdentityProvider for Arc<S>
where
    S: IdentityProvider + ?Sized,
{
    async fn get_session(&self) -> Result<Option<Session>, ProviderError> {
        (**self).get_session().await
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        (**self).sign_out().await
    }
}

/// In-memory provider for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    session: RwLock<Option<Session>>,
    sign_outs: AtomicUsize,
    unavailable: RwLock<Option<String>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        let provider = Self::new();
        provider.set_session(Some(session));
        provider
    }

    pub fn set_session(&self, session: Option<Session>) {
        if let Ok(mut slot) = self.session.write() {
            *slot = session;
        }
    }

    /// Make every subsequent call fail with `reason`.
    pub fn fail_with(&self, reason: impl Into<String>) {
        if let Ok(mut slot) = self.unavailable.write() {
            *slot = Some(reason.into());
        }
    }

    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), ProviderError> {
        let reason = self
            .unavailable
            .read()
            .map_err(|_| ProviderError::Unavailable("lock poisoned".to_string()))?;
        match reason.as_ref() {
            Some(r) => Err(ProviderError::Unavailable(r.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn get_session(&self) -> Result<Option<Session>, ProviderError> {
        self.check_available()?;
        let slot = self
            .session
            .read()
            .map_err(|_| ProviderError::Unavailable("lock poisoned".to_string()))?;
        Ok(slot.clone())
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.set_session(None);
        Ok(())
    }
}
