use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{CredentialStore, Credentials};
use crate::models::User;

/// On-disk shape of the credentials file.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCredentials {
    token: String,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
}

/// Credentials kept in a single JSON file, local to this machine.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credentials>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read credentials file: {:?}", self.path))?;

        let stored: StoredCredentials = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse credentials file: {:?}", self.path))?;

        if stored.token.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(Credentials::new(
            SecretString::from(stored.token),
            stored.user,
        )))
    }

    async fn save(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create credentials dir: {parent:?}"))?;
        }

        let stored = StoredCredentials {
            token: credentials.token.expose_secret().to_string(),
            user: credentials.user.clone(),
            saved_at: Some(Utc::now()),
        };
        let content =
            serde_json::to_string_pretty(&stored).context("Failed to serialize credentials")?;

        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write credentials file: {:?}", self.path))?;

        restrict_permissions(&self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        if self.path.exists() {
            tokio::fs::remove_file(&self.path)
                .await
                .with_context(|| format!("Failed to delete credentials file: {:?}", self.path))?;
        }
        Ok(())
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .await
        .with_context(|| format!("Failed to set permissions on {path:?}"))
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
