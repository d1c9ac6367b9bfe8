use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The signed-in user's profile as returned at login/signup.
///
/// Only refreshed at login/signup time. Fields the API sends that are not
/// modelled here are kept in `extra` so the stored record round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub profile_name: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn new(profile_name: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            profile_name: profile_name.into(),
            username: username.into(),
            email: None,
            avatar_url: None,
            school: None,
            role: None,
            extra: Map::new(),
        }
    }

    /// Name to show in headers and menus, falling back to the username
    pub fn display_name(&self) -> &str {
        let name = self.profile_name.trim();
        if name.is_empty() {
            &self.username
        } else {
            name
        }
    }

    /// Handle shown next to the display name, e.g. `@jdoe`
    pub fn handle(&self) -> String {
        format!("@{}", self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_profile() {
        let json = r#"{"profile_name": "Jane Doe", "username": "jdoe"}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.profile_name, "Jane Doe");
        assert_eq!(profile.username, "jdoe");
        assert_eq!(profile.email, None);
        assert!(profile.extra.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_preserved() {
        let json = r#"{"profile_name": "Jane Doe", "username": "jdoe", "grade": 11, "clubs": ["chess"]}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.extra.get("grade"), Some(&Value::from(11)));

        let back = serde_json::to_value(&profile).unwrap();
        assert_eq!(back["clubs"][0], "chess");
        assert_eq!(back["username"], "jdoe");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let mut profile = UserProfile::new("  ", "jdoe");
        assert_eq!(profile.display_name(), "jdoe");
        profile.profile_name = "Jane".to_string();
        assert_eq!(profile.display_name(), "Jane");
        assert_eq!(profile.handle(), "@jdoe");
    }

    #[test]
    fn test_missing_username_is_rejected() {
        let json = r#"{"profile_name": "Jane Doe"}"#;
        assert!(serde_json::from_str::<UserProfile>(json).is_err());
    }
}
