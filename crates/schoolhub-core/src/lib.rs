//! SchoolHub core - session and request plumbing for the SchoolHub app.
//!
//! - `auth`: credential store for the session token and cached profile
//! - `storage`: durable key-value backends the credential store sits on
//! - `api`: authenticated request pipeline and typed endpoints
//! - `session`: startup bootstrap, authenticated flag, login/signup/logout
//! - `navigation`: which screen stack to mount for a session status
//! - `config`: endpoint, timeout, storage and presence settings

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod navigation;
pub mod session;
pub mod storage;

pub use api::{ApiClient, ApiError};
pub use auth::CredentialStore;
pub use config::Config;
pub use navigation::{Root, Screen};
pub use session::{AuthStatus, SessionManager, SessionState};
