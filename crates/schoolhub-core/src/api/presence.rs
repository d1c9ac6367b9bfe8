//! Online-status ("presence") notifications.
//!
//! After most successful API responses the client tells the server the
//! user is active. The notifier is a port so the pipeline does not care
//! how the signal is delivered, and `PresencePolicy` holds the single
//! decision of which paths trigger it and whether the caller waits.

use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::{authorize, check_response};
use super::ApiError;
use crate::auth::CredentialStore;
use crate::models::OnlineStatus;

/// Path of the online-status endpoint, relative to the API base
pub const ONLINE_STATUS_PATH: &str = "v1.0/online-status";
pub const LOGIN_PATH: &str = "v1.0/login";
pub const REGISTER_PATH: &str = "register";

/// Delivers one online-status signal.
pub trait PresenceNotifier: Send + Sync {
    fn notify(&self) -> BoxFuture<'static, Result<(), ApiError>>;
}

/// Posts `OnlineStatus` to the API with the stored token.
///
/// Talks to the raw HTTP client so a notification never triggers another
/// notification.
pub struct HttpPresenceNotifier {
    client: Client,
    url: Url,
    credentials: CredentialStore,
}

impl HttpPresenceNotifier {
    pub fn new(client: Client, base_url: &Url, credentials: CredentialStore) -> Result<Self, ApiError> {
        let url = base_url
            .join(ONLINE_STATUS_PATH)
            .map_err(|e| ApiError::InvalidPath(format!("{}: {}", ONLINE_STATUS_PATH, e)))?;
        Ok(Self {
            client,
            url,
            credentials,
        })
    }
}

impl PresenceNotifier for HttpPresenceNotifier {
    fn notify(&self) -> BoxFuture<'static, Result<(), ApiError>> {
        let client = self.client.clone();
        let url = self.url.clone();
        let credentials = self.credentials.clone();

        async move {
            let request = client.post(url).json(&OnlineStatus::now());
            let response = authorize(request, &credentials).await.send().await?;
            check_response(response).await?;
            debug!("Online status delivered");
            Ok::<(), ApiError>(())
        }
        .boxed()
    }
}

/// Notifier that does nothing; for deployments without presence.
pub struct NoopPresence;

impl PresenceNotifier for NoopPresence {
    fn notify(&self) -> BoxFuture<'static, Result<(), ApiError>> {
        futures::future::ready(Ok(())).boxed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceMode {
    /// Spawn the notification and return the response immediately
    #[default]
    FireAndForget,
    /// Finish the notification before returning the response
    Await,
    Disabled,
}

/// Which successful requests trigger an online-status notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresencePolicy {
    pub mode: PresenceMode,
    /// Request paths, relative to the API base, that never notify.
    /// Compared exactly after normalization.
    pub excluded_paths: Vec<String>,
}

impl Default for PresencePolicy {
    fn default() -> Self {
        Self {
            mode: PresenceMode::default(),
            excluded_paths: vec![
                ONLINE_STATUS_PATH.to_string(),
                LOGIN_PATH.to_string(),
                REGISTER_PATH.to_string(),
            ],
        }
    }
}

impl PresencePolicy {
    pub fn disabled() -> Self {
        Self {
            mode: PresenceMode::Disabled,
            ..Self::default()
        }
    }

    /// Strip leading/trailing slashes, query and fragment
    pub fn normalize_path(path: &str) -> &str {
        let end = path.find(&['?', '#'][..]).unwrap_or(path.len());
        path[..end].trim_matches('/')
    }

    pub fn should_notify(&self, path: &str) -> bool {
        if self.mode == PresenceMode::Disabled {
            return false;
        }
        let path = Self::normalize_path(path);
        !self
            .excluded_paths
            .iter()
            .any(|excluded| Self::normalize_path(excluded) == path)
    }
}
