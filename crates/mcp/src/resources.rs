//! Resource handler for Slack data.
//!
//! Enumerates the `slack://` URI space and resolves a URI into a
//! serialized JSON document by querying the API client. Both entry
//! points are failure-proof: enumeration degrades to a single
//! synthetic error resource, and reads render every failure into the
//! returned text.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::error;

use slack_mcp_client::{ClientError, SlackClient};

use crate::types::ResourceInfo;

pub const MIME_JSON: &str = "application/json";
pub const MIME_TEXT: &str = "text/plain";

/// URI of the synthetic resource emitted when enumeration fails.
pub const ERROR_URI: &str = "slack://error";

/// Page size requested from the API when a resource needs a channel
/// or user listing.
const LIST_PAGE_SIZE: u32 = 100;

/// History documents default to the most recent messages.
const HISTORY_LIMIT: u32 = 50;

/// Parsed form of the `slack://` URI grammar.
///
/// Routing is an exhaustive match over this enum, so a new resource
/// shape cannot silently fall through to "unknown".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    /// `slack://channels` — all channels.
    Channels,
    /// `slack://users` — all users.
    Users,
    /// `slack://workspace` — workspace info.
    Workspace,
    /// `slack://channels/{id}` — one channel.
    Channel(String),
    /// `slack://channels/{id}/history` — recent messages.
    ChannelHistory(String),
}

impl ResourceUri {
    pub fn parse(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("slack://")?;
        let mut parts = rest.split('/');
        let segments = (parts.next(), parts.next(), parts.next(), parts.next());
        match segments {
            (Some("channels"), None, None, None) => Some(Self::Channels),
            (Some("users"), None, None, None) => Some(Self::Users),
            (Some("workspace"), None, None, None) => Some(Self::Workspace),
            (Some("channels"), Some(id), None, None) if !id.is_empty() => {
                Some(Self::Channel(id.to_string()))
            }
            (Some("channels"), Some(id), Some("history"), None) if !id.is_empty() => {
                Some(Self::ChannelHistory(id.to_string()))
            }
            _ => None,
        }
    }
}

/// The MIME type a resource read is served under. Everything is JSON
/// except the synthetic error resource.
pub fn mime_for_uri(uri: &str) -> &'static str {
    if uri == ERROR_URI {
        MIME_TEXT
    } else {
        MIME_JSON
    }
}

#[derive(Debug, thiserror::Error)]
enum ReadError {
    #[error("Unknown resource URI: {0}")]
    UnknownUri(String),
    #[error("Channel {0} not found")]
    ChannelNotFound(String),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Resolves MCP resource operations against the Slack client.
pub struct ResourceHandler {
    client: Arc<SlackClient>,
}

impl ResourceHandler {
    pub fn new(client: Arc<SlackClient>) -> Self {
        Self { client }
    }

    /// Enumerate all available resources: three static entries, then
    /// an info and a history entry for every channel, in listing
    /// order.
    ///
    /// A listing failure discards the partial list and returns one
    /// synthetic error resource, so the caller always receives a
    /// well-formed (if minimal) listing.
    pub async fn list_resources(&self) -> Vec<ResourceInfo> {
        let mut resources = vec![
            ResourceInfo {
                uri: "slack://channels".to_string(),
                name: "Slack Channels".to_string(),
                description: Some("List of all accessible Slack channels".to_string()),
                mime_type: MIME_JSON.to_string(),
            },
            ResourceInfo {
                uri: "slack://users".to_string(),
                name: "Slack Users".to_string(),
                description: Some("List of all users in the workspace".to_string()),
                mime_type: MIME_JSON.to_string(),
            },
            ResourceInfo {
                uri: "slack://workspace".to_string(),
                name: "Slack Workspace".to_string(),
                description: Some("Information about the current Slack workspace".to_string()),
                mime_type: MIME_JSON.to_string(),
            },
        ];

        match self.client.list_channels(LIST_PAGE_SIZE, true).await {
            Ok(channels) => {
                for channel in channels {
                    resources.push(ResourceInfo {
                        uri: format!("slack://channels/{}", channel.id),
                        name: format!("#{}", channel.name),
                        description: Some(format!("Messages from #{} channel", channel.name)),
                        mime_type: MIME_JSON.to_string(),
                    });
                    resources.push(ResourceInfo {
                        uri: format!("slack://channels/{}/history", channel.id),
                        name: format!("#{} History", channel.name),
                        description: Some(format!(
                            "Message history from #{} channel",
                            channel.name
                        )),
                        mime_type: MIME_JSON.to_string(),
                    });
                }
                resources
            }
            Err(e) => {
                error!(error = %e, "Error listing resources");
                vec![ResourceInfo {
                    uri: ERROR_URI.to_string(),
                    name: "Slack API Error".to_string(),
                    description: Some(format!("Error accessing Slack API: {e}")),
                    mime_type: MIME_TEXT.to_string(),
                }]
            }
        }
    }

    /// Resolve a URI to its serialized document.
    ///
    /// Every failure — unknown URI, missing channel, API error — is
    /// rendered into the returned text; this method has no error path.
    pub async fn read_resource(&self, uri: &str) -> String {
        match self.try_read(uri).await {
            Ok(doc) => doc,
            Err(e) => {
                error!(uri = %uri, error = %e, "Error reading resource");
                format!("Error reading resource: {e}")
            }
        }
    }

    async fn try_read(&self, uri: &str) -> Result<String, ReadError> {
        let parsed =
            ResourceUri::parse(uri).ok_or_else(|| ReadError::UnknownUri(uri.to_string()))?;
        match parsed {
            ResourceUri::Channels => self.read_channels().await,
            ResourceUri::Users => self.read_users().await,
            ResourceUri::Workspace => self.read_workspace().await,
            ResourceUri::Channel(id) => self.read_channel_info(&id).await,
            ResourceUri::ChannelHistory(id) => self.read_channel_history(&id).await,
        }
    }

    async fn read_channels(&self) -> Result<String, ReadError> {
        let channels = self.client.list_channels(LIST_PAGE_SIZE, true).await?;
        Ok(pretty(&serde_json::to_value(&channels).unwrap_or_default()))
    }

    async fn read_users(&self) -> Result<String, ReadError> {
        let users = self.client.list_users(LIST_PAGE_SIZE).await?;
        // The user document deliberately omits profile_image.
        let docs: Vec<Value> = users
            .iter()
            .map(|u| {
                json!({
                    "id": u.id,
                    "name": u.name,
                    "real_name": u.real_name,
                    "display_name": u.display_name,
                    "email": u.email,
                    "is_bot": u.is_bot,
                    "is_admin": u.is_admin,
                    "timezone": u.timezone,
                })
            })
            .collect();
        Ok(pretty(&Value::Array(docs)))
    }

    async fn read_workspace(&self) -> Result<String, ReadError> {
        let workspace = self.client.get_workspace_info().await?;
        let doc = json!({
            "id": workspace.id,
            "name": workspace.name,
            "domain": workspace.domain,
            "email_domain": workspace.email_domain,
            "enterprise_id": workspace.enterprise_id,
            "enterprise_name": workspace.enterprise_name,
        });
        Ok(pretty(&doc))
    }

    async fn read_channel_info(&self, channel_id: &str) -> Result<String, ReadError> {
        let channels = self.client.list_channels(LIST_PAGE_SIZE, true).await?;
        let channel = channels
            .into_iter()
            .find(|c| c.id == channel_id)
            .ok_or_else(|| ReadError::ChannelNotFound(channel_id.to_string()))?;
        Ok(pretty(&serde_json::to_value(&channel).unwrap_or_default()))
    }

    async fn read_channel_history(&self, channel_id: &str) -> Result<String, ReadError> {
        let messages = self
            .client
            .get_channel_history(channel_id, HISTORY_LIMIT, None, None)
            .await?;
        // History documents expose `ts` under the key "timestamp".
        let docs: Vec<Value> = messages
            .iter()
            .map(|m| {
                json!({
                    "timestamp": m.ts,
                    "channel": m.channel,
                    "user": m.user,
                    "text": m.text,
                    "thread_ts": m.thread_ts,
                    "reply_count": m.reply_count,
                    "reactions": m.reactions,
                    "attachments": m.attachments,
                    "files": m.files,
                    "edited": m.edited,
                    "permalink": m.permalink,
                })
            })
            .collect();
        Ok(pretty(&Value::Array(docs)))
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
