use std::sync::Arc;
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{ApiError, ApiResult};
use crate::models::Id;
use crate::notify::NotificationRelay;
use crate::session::SessionGuard;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the finance backend.
///
/// Adds the bearer token from the attached [`SessionGuard`] to every request.
/// A 401 on an authenticated request expires the session. Other failures are
/// forwarded to the attached [`NotificationRelay`] unless the client is
/// [`quiet`](Self::quiet).
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    session: Option<Arc<SessionGuard>>,
    relay: Option<NotificationRelay>,
    loud: bool,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("loud", &self.loud)
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: impl AsRef<str>) -> ApiResult<Self> {
        let raw = base_url.as_ref().trim();
        let parsed = Url::parse(raw).map_err(|e| ApiError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl {
                url: raw.to_string(),
                reason: "scheme must be http or https".to_string(),
            });
        }

        let http = Client::builder()
            .user_agent(concat!("finsight/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: raw.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            session: None,
            relay: None,
            loud: true,
        })
    }

    pub fn with_session(mut self, session: Arc<SessionGuard>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_relay(mut self, relay: NotificationRelay) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// A copy that never forwards failures to the relay. Session expiry still applies.
    pub fn quiet(&self) -> Self {
        let mut client = self.clone();
        client.loud = false;
        client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_quiet(&self) -> bool {
        !self.loud
    }

    pub fn session(&self) -> Option<&Arc<SessionGuard>> {
        self.session.as_ref()
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let (req, authenticated) = self.request(Method::GET, path);
        let body = self.execute(req.query(query), authenticated, path).await?;
        self.decode(&body, path)
    }

    /// GET a list; a `null` body reads as empty.
    pub(crate) async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<Vec<T>> {
        let items: Option<Vec<T>> = self.get(path, query).await?;
        Ok(items.unwrap_or_default())
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let (req, authenticated) = self.request(Method::POST, path);
        let body = self.execute(req.json(body), authenticated, path).await?;
        self.decode(&body, path)
    }

    pub(crate) async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let (req, authenticated) = self.request(Method::PUT, path);
        let body = self.execute(req.json(body), authenticated, path).await?;
        self.decode(&body, path)
    }

    pub(crate) async fn delete(&self, path: &str) -> ApiResult<()> {
        let (req, authenticated) = self.request(Method::DELETE, path);
        self.execute(req, authenticated, path).await?;
        Ok(())
    }

    /// `/finance/{resource}/{id}`, rejecting ids that are not one path segment.
    pub(crate) fn item_path(collection: &str, id: &Id) -> ApiResult<String> {
        if !id.is_path_safe() {
            return Err(ApiError::InvalidId(id.to_string()));
        }
        Ok(format!("{collection}/{id}"))
    }

    fn request(&self, method: Method, path: &str) -> (RequestBuilder, bool) {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, url).timeout(self.timeout);
        let authorization = self.session.as_ref().and_then(|s| s.authorization());
        let authenticated = authorization.is_some();
        if let Some(value) = authorization {
            req = req.header(AUTHORIZATION, value.expose_secret());
        }
        (req, authenticated)
    }

    async fn execute(
        &self,
        req: RequestBuilder,
        authenticated: bool,
        path: &str,
    ) -> ApiResult<String> {
        let response = match req.send().await {
            Ok(response) => response,
            Err(err) => return Err(self.fail(transport_error(&err), path)),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => return Err(self.fail(transport_error(&err), path)),
        };

        if status.is_success() {
            return Ok(body);
        }

        let message = extract_message(&body)
            .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));

        if status == StatusCode::UNAUTHORIZED {
            let err = ApiError::Unauthorized { message };
            if authenticated {
                if let Some(session) = &self.session {
                    tracing::debug!(path, "authenticated request rejected");
                    session.expire().await;
                    return Err(err);
                }
            }
            return Err(self.fail(err, path));
        }

        Err(self.fail(
            ApiError::Http {
                status: status.as_u16(),
                message,
            },
            path,
        ))
    }

    fn decode<T: DeserializeOwned>(&self, body: &str, path: &str) -> ApiResult<T> {
        let body = if body.trim().is_empty() { "null" } else { body };
        serde_json::from_str(body).map_err(|e| self.fail(ApiError::Decode(e.to_string()), path))
    }

    fn fail(&self, err: ApiError, path: &str) -> ApiError {
        tracing::debug!(path, error = %err, "request failed");
        if self.loud {
            if let Some(relay) = &self.relay {
                relay.error(err.user_message());
            }
        }
        err
    }
}

fn transport_error(err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Network(err.to_string())
    }
}

/// Human-readable message from an error body: `error`, then `detail`.
///
/// `detail` may be a string or a list of validation errors with a `msg` field.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    if let Some(error) = value.get("error").and_then(|v| v.as_str()) {
        return Some(error.to_string());
    }
    match value.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}
