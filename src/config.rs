use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::duration::{deserialize_duration, serialize_duration};

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "FINSIGHT_API_URL";

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

/// REST backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,

    /// Per-request timeout applied by the HTTP client.
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Background refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Period of the refresh timer.
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub interval: Duration,

    /// How old dashboard data can be before a visibility change forces a refresh.
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub staleness: Duration,

    /// Upper bound on a whole `fetch_all` batch.
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub fetch_timeout: Duration,

    /// Random jitter in the range [-jitter, +jitter] added to each timer period.
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub jitter: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2 * 60),
            staleness: Duration::from_secs(5 * 60),
            fetch_timeout: Duration::from_secs(15),
            jitter: Duration::ZERO,
        }
    }
}

/// Query parameters the dashboard uses when it loads its slices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Number of recent expenses/income records kept and requested.
    pub recent_limit: usize,

    /// Months of history requested for expense analytics.
    pub expense_months: u32,

    /// Number of goals requested.
    pub goals_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_limit: 10,
            expense_months: 6,
            goals_limit: 5,
        }
    }
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// How long a notification stays visible.
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub duration: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(4),
        }
    }
}

/// Display/output formatting configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Round currency values to this many decimal places before rendering.
    pub currency_decimals: Option<u32>,

    /// Render currency values with thousands separators.
    pub currency_grouping: bool,

    /// Optional currency symbol (e.g. "₹", "$") prefixed to rendered values.
    pub currency_symbol: Option<String>,

    /// When true and `currency_decimals` is set, pad to exactly that many decimals.
    pub currency_fixed_decimals: bool,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub refresh: RefreshConfig,
    pub dashboard: DashboardConfig,
    pub notifications: NotificationConfig,
    pub display: DisplayConfig,

    /// Where the auth token and user profile are persisted.
    /// Defaults to `<data_dir>/finsight/credentials.json`.
    pub credentials_path: Option<PathBuf>,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment overrides (currently only [`API_URL_ENV`]).
    pub fn with_env_overrides(self) -> Self {
        self.with_api_url_override(std::env::var(API_URL_ENV).ok())
    }

    pub fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            self.api.base_url = url;
        }
        self
    }

    /// Resolve where credentials live.
    pub fn resolve_credentials_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.credentials_path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir().context("Could not find data directory")?;
        Ok(data_dir.join("finsight").join("credentials.json"))
    }
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./finsight.toml` if it exists in current directory
/// 2. `<config_dir>/finsight/finsight.toml`
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("finsight.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("finsight").join("finsight.toml");
    }

    local_config
}
