use serde::{Deserialize, Serialize};

use crate::JsonObject;

/// Workspace (team) information.
///
/// `icon` mixes image URLs with an `image_default` boolean in the same
/// map, so it stays an open JSON object rather than a fixed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub domain: String,
    #[serde(default)]
    pub email_domain: Option<String>,
    #[serde(default)]
    pub icon: Option<JsonObject>,
    #[serde(default)]
    pub enterprise_id: Option<String>,
    #[serde(default)]
    pub enterprise_name: Option<String>,
}
