use serde::{Deserialize, Serialize};

/// A Slack user snapshot.
///
/// Users flagged deleted by the API are filtered at listing time and
/// are never materialized into this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl User {
    /// Best human-facing label: display name, then real name, then
    /// the account name.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.real_name.as_deref())
            .unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_defaults_on_minimal_input() {
        let user: User = serde_json::from_str(r#"{"id":"U1","name":"ana"}"#).unwrap();
        assert!(!user.is_bot);
        assert!(!user.is_admin);
        assert_eq!(user.email, None);
    }

    #[test]
    fn test_user_roundtrip_preserves_null_optionals() {
        let user = User {
            id: "U42".to_string(),
            name: "bob".to_string(),
            real_name: Some("Bob Builder".to_string()),
            display_name: None,
            email: None,
            is_bot: false,
            is_admin: true,
            timezone: Some("Europe/Berlin".to_string()),
            profile_image: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("display_name").unwrap().is_null());
        assert!(json.get("profile_image").unwrap().is_null());
        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_label_fallback_order() {
        let mut user: User = serde_json::from_str(r#"{"id":"U1","name":"ana"}"#).unwrap();
        assert_eq!(user.label(), "ana");
        user.real_name = Some("Ana Lytics".to_string());
        assert_eq!(user.label(), "Ana Lytics");
        user.display_name = Some("ana.l".to_string());
        assert_eq!(user.label(), "ana.l");
        // Slack sends empty display names for users who never set one.
        user.display_name = Some(String::new());
        assert_eq!(user.label(), "Ana Lytics");
    }
}
