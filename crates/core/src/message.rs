use serde::{Deserialize, Serialize};

use crate::JsonObject;

/// A single message in a channel.
///
/// `ts` is Slack's opaque timestamp token. It doubles as the
/// per-channel message identity and must round-trip exactly as a
/// string; it is compared for ordering/equality only, never parsed
/// as a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub ts: String,
    pub channel: String,
    #[serde(default)]
    pub user: Option<String>,
    pub text: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub reply_count: u32,
    #[serde(default)]
    pub reactions: Vec<JsonObject>,
    #[serde(default)]
    pub attachments: Vec<JsonObject>,
    #[serde(default)]
    pub files: Vec<JsonObject>,
    #[serde(default)]
    pub edited: Option<JsonObject>,
    #[serde(default)]
    pub permalink: Option<String>,
}
