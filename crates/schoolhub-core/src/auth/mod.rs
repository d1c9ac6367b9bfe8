//! Authentication module for persisting session credentials.
//!
//! This module provides:
//! - `CredentialStore`: the session token and cached profile, kept in a
//!   pluggable key-value backend (file, OS keychain, or memory)
//!
//! Tokens have no local expiry; a token is valid until logout or until the
//! API rejects it.

pub mod credentials;

pub use credentials::{CredentialStore, PROFILE_KEY, TOKEN_KEY};
