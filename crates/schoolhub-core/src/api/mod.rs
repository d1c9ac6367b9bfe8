//! REST API client module for SchoolHub services.
//!
//! This module provides the `ApiClient` for communicating with the
//! SchoolHub API: login, registration, profile and avatar lookups, and
//! online-status notifications.
//!
//! The API uses bearer token authentication. The token is read from the
//! `CredentialStore` for every request, so a login or logout takes effect
//! on the next call without touching the client.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod presence;

pub use client::ApiClient;
pub use error::ApiError;
pub use presence::{HttpPresenceNotifier, NoopPresence, PresenceMode, PresenceNotifier, PresencePolicy};
