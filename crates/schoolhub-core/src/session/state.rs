use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use super::bootstrap::{bootstrap, AuthStatus};
use crate::auth::CredentialStore;

/// Owner of the process-wide authenticated flag.
///
/// The flag is a cached view of the credential store. Readers get the
/// current value or a `watch` receiver; writes only happen through the
/// named transitions below.
#[derive(Clone)]
pub struct SessionState {
    tx: Arc<watch::Sender<AuthStatus>>,
}

impl SessionState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthStatus::Unknown);
        Self { tx: Arc::new(tx) }
    }

    pub fn status(&self) -> AuthStatus {
        *self.tx.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status().is_authenticated()
    }

    /// Receiver that observes every transition
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.tx.subscribe()
    }

    /// Enter `Loading`. Only valid from `Unknown`; returns whether it moved.
    pub fn start_bootstrap(&self) -> bool {
        self.tx.send_if_modified(|status| {
            if *status == AuthStatus::Unknown {
                *status = AuthStatus::Loading;
                true
            } else {
                false
            }
        })
    }

    /// Apply the bootstrap outcome. Ignored once the status has resolved,
    /// so a late startup read cannot undo a login or logout.
    pub fn resolve(&self, outcome: AuthStatus) -> bool {
        if outcome.is_pending() {
            return false;
        }
        let applied = self.tx.send_if_modified(|status| {
            if status.is_pending() {
                *status = outcome;
                true
            } else {
                false
            }
        });
        if applied {
            info!(status = %outcome, "Session resolved");
        } else {
            debug!(status = %outcome, "Ignoring late bootstrap result");
        }
        applied
    }

    /// Run the whole startup sequence against the credential store
    pub async fn bootstrap(&self, credentials: &CredentialStore) -> AuthStatus {
        self.start_bootstrap();
        let outcome = bootstrap(credentials).await;
        self.resolve(outcome);
        self.status()
    }

    pub fn login_succeeded(&self) {
        info!("Signed in");
        self.set(AuthStatus::Authenticated);
    }

    pub fn signup_succeeded(&self) {
        info!("Signed up");
        self.set(AuthStatus::Authenticated);
    }

    pub fn logged_out(&self) {
        info!("Signed out");
        self.set(AuthStatus::Unauthenticated);
    }

    fn set(&self, status: AuthStatus) {
        self.tx.send_if_modified(|current| {
            let changed = *current != status;
            *current = status;
            changed
        });
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
