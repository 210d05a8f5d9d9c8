//! Persisted sign-in state: the bearer token and the user profile.
//!
//! The token is kept as a [`SecretString`] in memory and only exposed when the
//! `Authorization` header is built or when it is written to disk.

mod file;

pub use file::FileCredentialStore;

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::models::User;

/// A signed-in session as persisted between runs.
#[derive(Debug)]
pub struct Credentials {
    pub token: SecretString,
    pub user: Option<User>,
}

impl Credentials {
    pub fn new(token: SecretString, user: Option<User>) -> Self {
        Self { token, user }
    }

    /// Copy the credentials, re-wrapping the token in a fresh secret.
    pub fn duplicate(&self) -> Self {
        Self {
            token: SecretString::from(self.token.expose_secret().to_string()),
            user: self.user.clone(),
        }
    }
}

/// Storage backend for [`Credentials`].
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns `Ok(None)` when nobody is signed in.
    async fn load(&self) -> Result<Option<Credentials>>;

    async fn save(&self, credentials: &Credentials) -> Result<()>;

    /// Remove persisted credentials. Clearing an empty store is not an error.
    async fn clear(&self) -> Result<()>;
}

/// In-memory store used by tests and embedders that manage persistence themselves.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Option<Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            inner: Mutex::new(Some(credentials)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<Credentials>> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.as_ref().map(Credentials::duplicate))
    }

    async fn save(&self, credentials: &Credentials) -> Result<()> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(credentials.duplicate());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_roundtrip_and_clear() -> Result<()> {
        let store = MemoryCredentialStore::new();
        assert!(store.load().await?.is_none());

        store
            .save(&Credentials::new(SecretString::from("tok".to_string()), None))
            .await?;
        let loaded = store.load().await?.expect("credentials saved");
        assert_eq!(loaded.token.expose_secret(), "tok");

        store.clear().await?;
        assert!(store.is_empty());
        store.clear().await?;
        Ok(())
    }
}
