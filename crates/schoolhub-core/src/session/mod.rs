//! Session bootstrap and the authenticated flag.
//!
//! This module provides:
//! - `bootstrap`: startup decision from one token read
//! - `SessionState`: single owner of the `AuthStatus` flag
//! - `SessionManager`: login, signup and logout flows

pub mod bootstrap;
pub mod manager;
pub mod state;

pub use bootstrap::{bootstrap, AuthStatus};
pub use manager::{SessionError, SessionManager};
pub use state::SessionState;
