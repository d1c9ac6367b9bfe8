//! Typed calls for the SchoolHub endpoints the app consumes.

use reqwest::{Method, Url};
use tracing::debug;

use super::presence::{LOGIN_PATH, ONLINE_STATUS_PATH, REGISTER_PATH};
use super::{ApiClient, ApiError};
use crate::models::{AuthResponse, LoginRequest, OnlineStatus, RegisterRequest, UserProfile};

const USERS_PATH: &str = "v1.0/users";

impl ApiClient {
    /// `v1.0/users/{username}/{resource}`, with the username pushed as a
    /// single percent-encoded segment.
    fn user_url(&self, username: &str, resource: &str) -> Result<Url, ApiError> {
        let mut url = self.url(USERS_PATH)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidPath(format!("{} cannot hold path segments", USERS_PATH)))?
            .pop_if_empty()
            .push(username)
            .push(resource);
        Ok(url)
    }

    /// Exchange credentials for a session token and profile
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let auth: AuthResponse = self.post(LOGIN_PATH, &body).await?;
        debug!(username = %auth.user.username, "Login accepted");
        Ok(auth)
    }

    /// Create an account; the response signs the new user in
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let auth: AuthResponse = self.post(REGISTER_PATH, request).await?;
        debug!(username = %auth.user.username, "Registration accepted");
        Ok(auth)
    }

    pub async fn fetch_profile(&self, username: &str) -> Result<UserProfile, ApiError> {
        let url = self.user_url(username, "profile")?;
        self.get_url(url).await
    }

    /// Raw avatar image bytes
    pub async fn fetch_avatar(&self, username: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.user_url(username, "avatar")?;
        self.get_bytes(url).await
    }

    /// Send an online-status signal directly, awaiting the result
    pub async fn notify_online(&self) -> Result<(), ApiError> {
        self.send(Method::POST, ONLINE_STATUS_PATH, Some(&OnlineStatus::now()))
            .await?;
        Ok(())
    }
}
