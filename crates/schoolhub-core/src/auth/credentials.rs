use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::UserProfile;
use crate::storage::{KeyValueStore, MemoryStore, StorageError};

/// Storage key for the raw session token
pub const TOKEN_KEY: &str = "auth_token";

/// Storage key for the JSON-serialized profile record
pub const PROFILE_KEY: &str = "user_info";

/// Persists the session token and the user's profile.
///
/// Clone is cheap and every clone sees the same backend. There is no
/// locking here: concurrent logout and login writes race exactly as the
/// underlying storage lets them.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Store backed by process memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Persist the token, replacing any previous one
    pub async fn save_token(&self, token: &str) -> Result<(), StorageError> {
        let token = token.to_string();
        self.blocking(move |backend| backend.set(TOKEN_KEY, &token)).await
    }

    /// Stored token, or `None` when signed out. An empty value counts as
    /// absent. Only a failing backend produces an error.
    pub async fn get_token(&self) -> Result<Option<String>, StorageError> {
        let token = self.blocking(|backend| backend.get(TOKEN_KEY)).await?;
        Ok(token.filter(|t| !t.is_empty()))
    }

    /// Whether a token is stored; read failures count as no token
    pub async fn has_token(&self) -> bool {
        matches!(self.get_token().await, Ok(Some(_)))
    }

    pub async fn clear_token(&self) -> Result<(), StorageError> {
        self.blocking(|backend| backend.remove(TOKEN_KEY)).await
    }

    /// Serialize and persist the profile, replacing any previous one
    pub async fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let json = serde_json::to_string(profile)
            .map_err(|e| StorageError::Unavailable(format!("profile not serializable: {}", e)))?;
        self.blocking(move |backend| backend.set(PROFILE_KEY, &json)).await
    }

    /// Stored profile. Missing or malformed content is `None`; malformed
    /// content is logged but never treated as fatal.
    pub async fn get_profile(&self) -> Result<Option<UserProfile>, StorageError> {
        let Some(raw) = self.blocking(|backend| backend.get(PROFILE_KEY)).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<UserProfile>(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                warn!(error = %e, "Stored profile is malformed, treating as absent");
                Ok(None)
            }
        }
    }

    pub async fn clear_profile(&self) -> Result<(), StorageError> {
        self.blocking(|backend| backend.remove(PROFILE_KEY)).await
    }

    /// Run a backend call on the blocking pool so keychain and disk access
    /// never stall the event loop.
    async fn blocking<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn KeyValueStore) -> Result<T, StorageError> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        debug!(backend = backend.name(), "Storage call");
        tokio::task::spawn_blocking(move || op(backend.as_ref()))
            .await
            .map_err(|e| StorageError::Unavailable(format!("storage task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStore;

    /// Backend whose every call fails
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disk gone".to_string()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk gone".to_string()))
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk gone".to_string()))
        }
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_token_round_trip() {
        let store = CredentialStore::in_memory();
        for token in ["abc123", "eyJhbGciOiJIUzI1NiJ9.e30.sig", "with spaces and ünïcode"] {
            store.save_token(token).await.unwrap();
            assert_eq!(store.get_token().await.unwrap().as_deref(), Some(token));
        }
    }

    #[tokio::test]
    async fn test_clear_token_from_any_state() {
        let store = CredentialStore::in_memory();

        // Clearing with nothing stored
        store.clear_token().await.unwrap();
        assert_eq!(store.get_token().await.unwrap(), None);

        store.save_token("abc123").await.unwrap();
        store.clear_token().await.unwrap();
        assert_eq!(store.get_token().await.unwrap(), None);
        assert!(!store.has_token().await);
    }

    #[tokio::test]
    async fn test_empty_token_is_absent() {
        let store = CredentialStore::in_memory();
        store.save_token("").await.unwrap();
        assert_eq!(store.get_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_profile_round_trip() {
        let store = CredentialStore::in_memory();
        assert_eq!(store.get_profile().await.unwrap(), None);

        let mut profile = UserProfile::new("Jane Doe", "jdoe");
        profile.school = Some("Lincoln High".to_string());
        store.save_profile(&profile).await.unwrap();

        assert_eq!(store.get_profile().await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn test_malformed_profile_is_absent() {
        let backend = Arc::new(MemoryStore::new());
        backend.set(PROFILE_KEY, "{not json").unwrap();
        let store = CredentialStore::new(backend.clone());
        assert_eq!(store.get_profile().await.unwrap(), None);

        // Valid JSON of the wrong shape is malformed too
        backend.set(PROFILE_KEY, r#"["jdoe"]"#).unwrap();
        assert_eq!(store.get_profile().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_token_keeps_profile() {
        let store = CredentialStore::in_memory();
        store.save_token("abc123").await.unwrap();
        store.save_profile(&UserProfile::new("Jane Doe", "jdoe")).await.unwrap();

        store.clear_token().await.unwrap();
        assert!(store.get_profile().await.unwrap().is_some());

        store.clear_profile().await.unwrap();
        assert_eq!(store.get_profile().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_backend_failures_surface_as_storage_errors() {
        let store = CredentialStore::new(Arc::new(BrokenStore));
        assert!(store.save_token("abc123").await.is_err());
        assert!(store.get_token().await.is_err());
        assert!(store.get_profile().await.is_err());
        assert!(!store.has_token().await);
    }

    #[tokio::test]
    async fn test_file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = CredentialStore::new(Arc::new(FileStore::new(dir.path())));
            store.save_token("abc123").await.unwrap();
        }
        let reopened = CredentialStore::new(Arc::new(FileStore::new(dir.path())));
        assert_eq!(reopened.get_token().await.unwrap().as_deref(), Some("abc123"));
        assert_eq!(reopened.backend_name(), "file");
    }
}
