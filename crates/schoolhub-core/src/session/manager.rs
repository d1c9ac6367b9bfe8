use thiserror::Error;
use tracing::{error, info, warn};

use super::{AuthStatus, SessionState};
use crate::api::{ApiClient, ApiError};
use crate::auth::CredentialStore;
use crate::models::{AuthResponse, RegisterRequest, UserProfile};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SessionError {
    /// Text for the login/signup screen
    pub fn user_message(&self) -> String {
        match self {
            SessionError::MissingField(_) => "Username and password required".to_string(),
            SessionError::Api(e) => e.user_message(),
        }
    }
}

/// Login, signup and logout flows.
///
/// Persists what the API returns into the credential store and flips the
/// shared `SessionState`. Storage write failures are logged, never raised:
/// the session is live for this run even if it cannot be remembered.
#[derive(Clone)]
pub struct SessionManager {
    api: ApiClient,
    state: SessionState,
    forget_profile_on_logout: bool,
}

impl SessionManager {
    pub fn new(api: ApiClient, state: SessionState) -> Self {
        Self {
            api,
            state,
            forget_profile_on_logout: false,
        }
    }

    /// Also clear the cached profile when logging out
    pub fn forget_profile_on_logout(mut self, forget: bool) -> Self {
        self.forget_profile_on_logout = forget;
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn credentials(&self) -> &CredentialStore {
        self.api.credentials()
    }

    /// Resolve the startup status from the stored token
    pub async fn bootstrap(&self) -> AuthStatus {
        self.state.bootstrap(self.credentials()).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile, SessionError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(SessionError::MissingField("username"));
        }
        if password.is_empty() {
            return Err(SessionError::MissingField("password"));
        }

        match self.api.login(username, password).await {
            Ok(auth) => {
                let profile = self.persist(auth).await;
                self.state.login_succeeded();
                info!(username = %profile.username, "Login successful");
                Ok(profile)
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                Err(e.into())
            }
        }
    }

    pub async fn signup(&self, request: &RegisterRequest) -> Result<UserProfile, SessionError> {
        if let Some(field) = request.missing_field() {
            return Err(SessionError::MissingField(field));
        }

        match self.api.register(request).await {
            Ok(auth) => {
                let profile = self.persist(auth).await;
                self.state.signup_succeeded();
                info!(username = %profile.username, "Signup successful");
                Ok(profile)
            }
            Err(e) => {
                error!(error = %e, "Signup failed");
                Err(e.into())
            }
        }
    }

    /// Drop the stored token and mark the session signed out. The profile
    /// record stays unless `forget_profile_on_logout` is set.
    pub async fn logout(&self) {
        if let Err(e) = self.credentials().clear_token().await {
            warn!(error = %e, "Failed to clear session token");
        }
        if self.forget_profile_on_logout {
            if let Err(e) = self.credentials().clear_profile().await {
                warn!(error = %e, "Failed to clear cached profile");
            }
        }
        self.state.logged_out();
    }

    /// Cached profile of the signed-in user; storage failures read as none
    pub async fn current_profile(&self) -> Option<UserProfile> {
        match self.credentials().get_profile().await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "Failed to read cached profile");
                None
            }
        }
    }

    async fn persist(&self, auth: AuthResponse) -> UserProfile {
        if let Err(e) = self.credentials().save_token(&auth.token).await {
            warn!(error = %e, "Failed to save session token");
        }
        if let Err(e) = self.credentials().save_profile(&auth.user).await {
            warn!(error = %e, "Failed to save profile");
        }
        auth.user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use mockito::{Matcher, Server, ServerGuard};

    use crate::api::PresencePolicy;
    use crate::storage::{KeyValueStore, StorageError};

    const AUTH_BODY: &str =
        r#"{"token": "abc123", "user": {"profile_name": "Jane Doe", "username": "jdoe", "role": "student"}}"#;

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("read-only".to_string()))
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("read-only".to_string()))
        }
        fn name(&self) -> &'static str {
            "read-only"
        }
    }

    fn manager(server: &ServerGuard, credentials: CredentialStore) -> SessionManager {
        let api = ApiClient::new(&server.url(), Duration::from_secs(5), credentials)
            .unwrap()
            .with_policy(PresencePolicy::disabled());
        SessionManager::new(api, SessionState::new())
    }

    #[tokio::test]
    async fn test_login_persists_and_authenticates() {
        let mut server = Server::new_async().await;
        let _login = server
            .mock("POST", "/v1.0/login")
            .with_status(200)
            .with_body(AUTH_BODY)
            .create_async()
            .await;

        let credentials = CredentialStore::in_memory();
        let manager = manager(&server, credentials.clone());
        assert_eq!(manager.bootstrap().await, AuthStatus::Unauthenticated);

        let profile = manager.login(" jdoe ", "hunter22").await.unwrap();
        assert_eq!(profile.role.as_deref(), Some("student"));
        assert!(manager.state().is_authenticated());
        assert_eq!(credentials.get_token().await.unwrap().as_deref(), Some("abc123"));
        assert_eq!(manager.current_profile().await, Some(profile));
    }

    #[tokio::test]
    async fn test_token_from_login_is_used_by_next_request() {
        let mut server = Server::new_async().await;
        let _login = server
            .mock("POST", "/v1.0/login")
            .with_status(200)
            .with_body(AUTH_BODY)
            .create_async()
            .await;
        let profile = server
            .mock("GET", "/v1.0/users/jdoe/profile")
            .match_header("authorization", "Bearer abc123")
            .with_status(200)
            .with_body(r#"{"profile_name": "Jane Doe", "username": "jdoe"}"#)
            .create_async()
            .await;

        let manager = manager(&server, CredentialStore::in_memory());
        manager.login("jdoe", "hunter22").await.unwrap();
        manager.api().fetch_profile("jdoe").await.unwrap();
        profile.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_requires_credentials() {
        let server = Server::new_async().await;
        let manager = manager(&server, CredentialStore::in_memory());

        let err = manager.login("  ", "pw").await.unwrap_err();
        assert!(matches!(err, SessionError::MissingField("username")));
        let err = manager.login("jdoe", "").await.unwrap_err();
        assert!(matches!(err, SessionError::MissingField("password")));
        assert_eq!(err.user_message(), "Username and password required");
        assert_eq!(manager.state().status(), AuthStatus::Unknown);
    }

    #[tokio::test]
    async fn test_failed_login_leaves_state_alone() {
        let mut server = Server::new_async().await;
        let _login = server
            .mock("POST", "/v1.0/login")
            .with_status(401)
            .create_async()
            .await;

        let credentials = CredentialStore::in_memory();
        let manager = manager(&server, credentials.clone());
        manager.bootstrap().await;

        let err = manager.login("jdoe", "wrong").await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid username or password");
        assert_eq!(manager.state().status(), AuthStatus::Unauthenticated);
        assert_eq!(credentials.get_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_storage_write_failure_still_authenticates() {
        let mut server = Server::new_async().await;
        let _login = server
            .mock("POST", "/v1.0/login")
            .with_status(200)
            .with_body(AUTH_BODY)
            .create_async()
            .await;

        let manager = manager(&server, CredentialStore::new(Arc::new(ReadOnlyStore)));
        let profile = manager.login("jdoe", "hunter22").await.unwrap();
        assert_eq!(profile.username, "jdoe");
        assert!(manager.state().is_authenticated());

        // Logout clears what it can and still signs out
        manager.logout().await;
        assert_eq!(manager.state().status(), AuthStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_signup() {
        let mut server = Server::new_async().await;
        let _register = server
            .mock("POST", "/register")
            .match_body(Matcher::PartialJson(serde_json::json!({"profile_name": "Jane Doe"})))
            .with_status(201)
            .with_body(AUTH_BODY)
            .create_async()
            .await;

        let credentials = CredentialStore::in_memory();
        let manager = manager(&server, credentials.clone());
        let request = RegisterRequest {
            profile_name: "Jane Doe".to_string(),
            username: "jdoe".to_string(),
            email: "jane@example.edu".to_string(),
            password: "hunter22".to_string(),
        };
        manager.signup(&request).await.unwrap();
        assert!(manager.state().is_authenticated());
        assert!(credentials.has_token().await);

        let incomplete = RegisterRequest {
            email: String::new(),
            ..request
        };
        let err = manager.signup(&incomplete).await.unwrap_err();
        assert!(matches!(err, SessionError::MissingField("email")));
    }

    #[tokio::test]
    async fn test_logout_keeps_profile_by_default() {
        let server = Server::new_async().await;
        let credentials = CredentialStore::in_memory();
        credentials.save_token("abc123").await.unwrap();
        credentials.save_profile(&UserProfile::new("Jane Doe", "jdoe")).await.unwrap();

        let manager = manager(&server, credentials.clone());
        assert_eq!(manager.bootstrap().await, AuthStatus::Authenticated);

        manager.logout().await;
        assert_eq!(manager.state().status(), AuthStatus::Unauthenticated);
        assert_eq!(credentials.get_token().await.unwrap(), None);
        assert!(credentials.get_profile().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_logout_can_forget_profile() {
        let server = Server::new_async().await;
        let credentials = CredentialStore::in_memory();
        credentials.save_token("abc123").await.unwrap();
        credentials.save_profile(&UserProfile::new("Jane Doe", "jdoe")).await.unwrap();

        let manager = manager(&server, credentials.clone()).forget_profile_on_logout(true);
        manager.logout().await;
        assert_eq!(credentials.get_profile().await.unwrap(), None);
        assert_eq!(manager.current_profile().await, None);
    }
}
