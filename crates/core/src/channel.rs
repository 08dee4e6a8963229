use serde::{Deserialize, Serialize};

/// A Slack channel snapshot.
///
/// Identity is `id`. The `name` is mutable on the Slack side, so it
/// must not be assumed unique across renames within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_general: bool,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub member_count: Option<u32>,
}
