//! Sign-in state shared by the API client, the store and the refresh controller.
//!
//! A 401 from an authenticated request ends the session exactly once: the
//! credentials are cleared, [`SessionEvent::Expired`] is broadcast and the user
//! is told to sign in again. Further 401s are absorbed until the next sign-in.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::broadcast;

use crate::credentials::{CredentialStore, Credentials};
use crate::models::User;
use crate::notify::NotificationRelay;

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
    /// The backend rejected the token; hosts should route to their login screen.
    Expired,
}

type ExpiryHook = Box<dyn Fn() + Send + Sync>;

pub struct SessionGuard {
    store: Arc<dyn CredentialStore>,
    current: RwLock<Option<Credentials>>,
    expired: AtomicBool,
    events: broadcast::Sender<SessionEvent>,
    relay: Option<NotificationRelay>,
    expiry_hooks: Mutex<Vec<ExpiryHook>>,
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("signed_in", &self.is_signed_in())
            .field("expired", &self.expired.load(Ordering::SeqCst))
            .finish()
    }
}

impl SessionGuard {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            store,
            current: RwLock::new(None),
            expired: AtomicBool::new(false),
            events,
            relay: None,
            expiry_hooks: Mutex::new(Vec::new()),
        }
    }

    /// Notify the user through `relay` when the session expires.
    pub fn with_relay(mut self, relay: NotificationRelay) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Run `hook` synchronously whenever the session expires, before
    /// [`SessionEvent::Expired`] is broadcast.
    pub fn on_expire(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.expiry_hooks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Box::new(hook));
    }

    /// Load persisted credentials. Returns whether a session was restored.
    pub async fn restore(&self) -> Result<bool> {
        let loaded = self.store.load().await?;
        let restored = loaded.is_some();
        *self.write_current() = loaded;
        if restored {
            self.expired.store(false, Ordering::SeqCst);
            tracing::debug!("restored persisted session");
        }
        Ok(restored)
    }

    /// Persist and activate new credentials.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<()> {
        self.store.save(&credentials).await?;
        *self.write_current() = Some(credentials);
        self.expired.store(false, Ordering::SeqCst);
        let _ = self.events.send(SessionEvent::SignedIn);
        tracing::info!("signed in");
        Ok(())
    }

    /// Explicit logout.
    pub async fn sign_out(&self) -> Result<()> {
        *self.write_current() = None;
        self.store.clear().await?;
        self.expired.store(false, Ordering::SeqCst);
        let _ = self.events.send(SessionEvent::SignedOut);
        tracing::info!("signed out");
        Ok(())
    }

    /// End the session after a 401.
    ///
    /// Returns true only for the call that actually performed the expiry.
    pub async fn expire(&self) -> bool {
        if self
            .expired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        *self.write_current() = None;
        if let Err(err) = self.store.clear().await {
            tracing::warn!(error = %err, "failed to clear persisted credentials");
        }
        tracing::warn!("session expired");
        for hook in self.expiry_hooks.lock().unwrap_or_else(|e| e.into_inner()).iter() {
            hook();
        }
        let _ = self.events.send(SessionEvent::Expired);
        if let Some(relay) = &self.relay {
            relay.error(SESSION_EXPIRED_MESSAGE);
        }
        true
    }

    pub fn is_signed_in(&self) -> bool {
        self.read_current().is_some()
    }

    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    pub fn user(&self) -> Option<User> {
        self.read_current().as_ref().and_then(|c| c.user.clone())
    }

    /// Replace the cached profile, e.g. after a profile update.
    pub async fn set_user(&self, user: User) -> Result<()> {
        let updated = {
            let mut current = self.write_current();
            match current.as_mut() {
                Some(credentials) => {
                    credentials.user = Some(user);
                    Some(credentials.duplicate())
                }
                None => None,
            }
        };
        if let Some(credentials) = updated {
            self.store.save(&credentials).await?;
        }
        Ok(())
    }

    /// Value for the `Authorization` header, if signed in.
    pub fn authorization(&self) -> Option<SecretString> {
        self.read_current().as_ref().map(|c| {
            SecretString::from(format!("Bearer {}", c.token.expose_secret()))
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn read_current(&self) -> std::sync::RwLockReadGuard<'_, Option<Credentials>> {
        self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_current(&self) -> std::sync::RwLockWriteGuard<'_, Option<Credentials>> {
        self.current.write().unwrap_or_else(|e| e.into_inner())
    }
}
