//! Data models exchanged with the SchoolHub API.
//!
//! - `UserProfile`: the cached profile record
//! - `LoginRequest`, `RegisterRequest`, `AuthResponse`: login/signup bodies
//! - `OnlineStatus`: presence payload

pub mod auth;
pub mod profile;

pub use auth::{AuthResponse, LoginRequest, OnlineStatus, RegisterRequest};
pub use profile::UserProfile;
