use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserProfile;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub profile_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Name of the first required field that is blank, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("profile_name", &self.profile_name),
            ("username", &self.username),
            ("email", &self.email),
            ("password", &self.password),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Body returned by both login and registration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Presence payload posted to the online-status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct OnlineStatus {
    pub online: bool,
    pub last_seen: DateTime<Utc>,
}

impl OnlineStatus {
    pub fn now() -> Self {
        Self {
            online: true,
            last_seen: Utc::now(),
        }
    }
}
