//! Authenticated request pipeline for the SchoolHub REST API.
//!
//! Every request made through `ApiClient` passes two interceptors:
//! the stored session token is attached on the way out, and a successful
//! response triggers an online-status notification unless the path is
//! excluded by the `PresencePolicy`. Errors from the primary request are
//! returned unchanged; nothing here retries.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::presence::{HttpPresenceNotifier, PresenceMode, PresenceNotifier, PresencePolicy};
use super::ApiError;
use crate::auth::CredentialStore;
use crate::config::Config;

/// API client for SchoolHub.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling,
/// so clones act as one process-wide client.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    credentials: CredentialStore,
    presence: Arc<dyn PresenceNotifier>,
    policy: Arc<PresencePolicy>,
}

impl ApiClient {
    /// Create a client for `base_url` with a per-request timeout. Presence
    /// notifications go to the same API with the default policy.
    pub fn new(base_url: &str, timeout: Duration, credentials: CredentialStore) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        let presence = HttpPresenceNotifier::new(client.clone(), &base_url, credentials.clone())?;

        Ok(Self {
            client,
            base_url,
            credentials,
            presence: Arc::new(presence),
            policy: Arc::new(PresencePolicy::default()),
        })
    }

    pub fn from_config(config: &Config, credentials: CredentialStore) -> Result<Self, ApiError> {
        Ok(Self::new(&config.api_base_url, config.request_timeout(), credentials)?
            .with_policy(config.presence.clone()))
    }

    /// Replace the presence port
    pub fn with_presence(mut self, presence: Arc<dyn PresenceNotifier>) -> Self {
        self.presence = presence;
        self
    }

    pub fn with_policy(mut self, policy: PresencePolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn policy(&self) -> &PresencePolicy {
        &self.policy
    }

    /// Resolve a path relative to the API base
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        if path.contains("://") {
            return Err(ApiError::InvalidPath(format!("{} is not relative", path)));
        }
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidPath(format!("{}: {}", path, e)))
    }

    /// Path of a resolved URL relative to the API base. URLs outside the
    /// base keep their absolute path.
    pub fn relative_path<'a>(&self, url: &'a Url) -> &'a str {
        url.path()
            .strip_prefix(self.base_url.path())
            .unwrap_or_else(|| url.path())
    }

    /// Send a request through the pipeline and return the successful response.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ApiError> {
        let url = self.url(path)?;
        self.send_to(method, url, body).await
    }

    /// Same as [`send`](Self::send) for an already resolved URL.
    pub async fn send_to<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Response, ApiError> {
        let path = self.relative_path(&url).to_string();
        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let request = authorize(request, &self.credentials).await;

        debug!(%method, path = %path, "Sending request");
        let response = request.send().await?;
        let response = check_response(response).await?;

        self.after_success(&path).await;
        Ok(response)
    }

    /// GET a JSON resource through the pipeline
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path)?;
        self.get_url(url).await
    }

    pub(crate) async fn get_url<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let path = self.relative_path(&url).to_string();
        let response = self.send_to::<()>(Method::GET, url, None).await?;
        parse_json(response, &path).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        parse_json(response, path).await
    }

    pub(crate) async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, ApiError> {
        let response = self.send_to::<()>(Method::GET, url, None).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Incoming interceptor: fire the online-status notification for
    /// paths the policy does not exclude. `path` is the resolved path
    /// relative to the base. Its failures never reach the caller.
    async fn after_success(&self, path: &str) {
        if !self.policy.should_notify(path) {
            return;
        }

        let notification = self.presence.notify();
        match self.policy.mode {
            PresenceMode::FireAndForget => {
                let path = path.to_string();
                tokio::spawn(async move {
                    if let Err(e) = notification.await {
                        warn!(error = %e, path = %path, "Online status notification failed");
                    }
                });
            }
            PresenceMode::Await => {
                if let Err(e) = notification.await {
                    warn!(error = %e, path, "Online status notification failed");
                }
            }
            PresenceMode::Disabled => {}
        }
    }
}

fn normalize_base_url(base_url: &str) -> Result<Url, ApiError> {
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base).map_err(|e| ApiError::InvalidPath(format!("{}: {}", base, e)))
}

/// Outgoing interceptor: attach the stored token as a bearer credential.
/// A failed token read is logged and the request goes out without it.
pub(crate) async fn authorize(request: RequestBuilder, credentials: &CredentialStore) -> RequestBuilder {
    match credentials.get_token().await {
        Ok(Some(token)) => request.bearer_auth(token),
        Ok(None) => request,
        Err(e) => {
            warn!(error = %e, "Could not read session token, sending request without it");
            request
        }
    }
}

/// Check if response is successful, returning an error with body if not.
pub(crate) async fn check_response(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ApiError> {
    let text = response.text().await?;
    serde_json::from_str(&text)
        .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))
}
