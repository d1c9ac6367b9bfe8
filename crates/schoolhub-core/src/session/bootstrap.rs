use std::fmt;

use tracing::{debug, warn};

use crate::auth::CredentialStore;

/// Whether the app has a signed-in user.
///
/// Moves `Unknown -> Loading -> Authenticated | Unauthenticated` once at
/// startup; afterwards only login, signup and logout change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStatus {
    #[default]
    Unknown,
    Loading,
    Authenticated,
    Unauthenticated,
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Authenticated)
    }

    /// Still waiting on the startup storage read
    pub fn is_pending(&self) -> bool {
        matches!(self, AuthStatus::Unknown | AuthStatus::Loading)
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthStatus::Unknown => write!(f, "unknown"),
            AuthStatus::Loading => write!(f, "loading"),
            AuthStatus::Authenticated => write!(f, "authenticated"),
            AuthStatus::Unauthenticated => write!(f, "unauthenticated"),
        }
    }
}

/// Decide the startup status from a single token read.
///
/// A failed read resolves exactly like a missing token.
pub async fn bootstrap(credentials: &CredentialStore) -> AuthStatus {
    match credentials.get_token().await {
        Ok(Some(_)) => {
            debug!("Stored token found");
            AuthStatus::Authenticated
        }
        Ok(None) => {
            debug!("No stored token");
            AuthStatus::Unauthenticated
        }
        Err(e) => {
            warn!(error = %e, "Token read failed during bootstrap, starting signed out");
            AuthStatus::Unauthenticated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::storage::{KeyValueStore, StorageError};

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("no storage".to_string()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("no storage".to_string()))
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("no storage".to_string()))
        }
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_no_token_is_unauthenticated() {
        let credentials = CredentialStore::in_memory();
        assert_eq!(bootstrap(&credentials).await, AuthStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_stored_token_is_authenticated() {
        let credentials = CredentialStore::in_memory();
        credentials.save_token("abc123").await.unwrap();
        assert_eq!(bootstrap(&credentials).await, AuthStatus::Authenticated);
    }

    #[tokio::test]
    async fn test_read_failure_is_unauthenticated() {
        let credentials = CredentialStore::new(Arc::new(BrokenStore));
        assert_eq!(bootstrap(&credentials).await, AuthStatus::Unauthenticated);
    }

    #[test]
    fn test_status_predicates() {
        assert!(AuthStatus::Unknown.is_pending());
        assert!(AuthStatus::Loading.is_pending());
        assert!(!AuthStatus::Unauthenticated.is_pending());
        assert!(AuthStatus::Authenticated.is_authenticated());
        assert_eq!(AuthStatus::Loading.to_string(), "loading");
    }
}
