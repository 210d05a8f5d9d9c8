//! Wiring of the client core: config, persisted credentials, session,
//! notifications, HTTP client and dashboard store.

use std::sync::Arc;

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::api::{ApiClient, FinanceBackend};
use crate::chat::ChatSession;
use crate::config::Config;
use crate::credentials::{CredentialStore, Credentials, FileCredentialStore};
use crate::models::{AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest, User};
use crate::notify::NotificationRelay;
use crate::portfolio::DashboardFigures;
use crate::refresh::RefreshController;
use crate::session::SessionGuard;
use crate::store::{DashboardStore, StoreOptions};

pub struct App {
    config: Config,
    relay: NotificationRelay,
    session: Arc<SessionGuard>,
    client: ApiClient,
    store: DashboardStore,
}

impl App {
    /// Builds the app with the file-backed credential store and restores any
    /// persisted session.
    pub async fn open(config: Config) -> Result<Self> {
        let path = config.resolve_credentials_path()?;
        let app = Self::with_credential_store(config, Arc::new(FileCredentialStore::new(path)))?;
        app.session
            .restore()
            .await
            .context("Failed to restore saved session")?;
        Ok(app)
    }

    pub fn with_credential_store(
        config: Config,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self> {
        let relay = NotificationRelay::new(config.notifications.duration);
        let session = Arc::new(SessionGuard::new(credentials).with_relay(relay.clone()));
        let client = ApiClient::new(&config.api.base_url)
            .with_context(|| format!("Invalid API base URL: {}", config.api.base_url))?
            .with_timeout(config.api.request_timeout)
            .with_session(session.clone())
            .with_relay(relay.clone());
        let backend: Arc<dyn FinanceBackend> = Arc::new(client.quiet());
        let store =
            DashboardStore::with_options(backend, relay.clone(), StoreOptions::from_config(&config));
        // The store reaches the session through its client; hold it weakly.
        let weak = store.downgrade();
        session.on_expire(move || {
            if let Some(store) = weak.upgrade() {
                store.reset();
                info!("Dashboard data dropped after session expiry");
            }
        });

        Ok(Self {
            config,
            relay,
            session,
            client,
            store,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn relay(&self) -> &NotificationRelay {
        &self.relay
    }

    pub fn session(&self) -> &Arc<SessionGuard> {
        &self.session
    }

    /// Client that reports failures through the relay.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &DashboardStore {
        &self.store
    }

    pub fn refresh_controller(&self) -> RefreshController {
        RefreshController::from_config(self.store.clone(), &self.config.refresh)
            .with_session(self.session.clone())
    }

    pub fn chat(&self) -> ChatSession {
        ChatSession::new(self.client.clone())
    }

    pub fn figures(&self) -> DashboardFigures {
        DashboardFigures::from_state(&self.store.snapshot())
    }

    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.expose_secret().to_string(),
        };
        let auth = self.client.login(&request).await.context("Login failed")?;
        self.start_session(auth).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        let auth = self
            .client
            .register(request)
            .await
            .context("Registration failed")?;
        self.start_session(auth).await
    }

    async fn start_session(&self, auth: AuthResponse) -> Result<User> {
        let user = auth.user;
        self.session
            .sign_in(Credentials::new(auth.access_token, Some(user.clone())))
            .await
            .context("Failed to save credentials")?;
        self.store.reset();
        info!(email = %user.email, "Session started");
        Ok(user)
    }

    /// Clears credentials and drops everything loaded for the previous user.
    pub async fn logout(&self) -> Result<()> {
        self.session
            .sign_out()
            .await
            .context("Failed to clear credentials")?;
        self.store.reset();
        Ok(())
    }

    /// Fetches the profile and refreshes the persisted copy.
    pub async fn profile(&self) -> Result<User> {
        let user = self.client.profile().await.context("Failed to load profile")?;
        self.session
            .set_user(user.clone())
            .await
            .context("Failed to save profile")?;
        Ok(user)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        let user = self
            .client
            .update_profile(update)
            .await
            .context("Failed to update profile")?;
        self.session
            .set_user(user.clone())
            .await
            .context("Failed to save profile")?;
        Ok(user)
    }

    /// Stops background work tied to the store.
    pub fn shutdown(&self) {
        self.store.shutdown();
    }
}
