//! Tool handler for Slack actions.
//!
//! A static catalog of six tools and their dispatch. Arguments are
//! validated against the declared schema (required fields, numeric
//! bounds) before any API call; every failure is returned as an
//! error-flagged result, never an error value.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use slack_mcp_client::{ClientError, SlackClient};

use crate::types::{CallToolResult, ToolContent, ToolInfo};

const DEFAULT_HISTORY_LIMIT: u32 = 50;
const DEFAULT_LIST_LIMIT: u32 = 100;
const DEFAULT_SEARCH_COUNT: u32 = 20;
const MAX_LIST_LIMIT: u32 = 1000;
const MAX_SEARCH_COUNT: u32 = 100;

/// Every tool this server exposes.
///
/// Dispatch is an exhaustive match over this enum; adding a variant
/// without wiring it up is a compile error, so a new tool cannot
/// silently fall through to "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    PostMessage,
    GetChannelHistory,
    ListChannels,
    GetUserInfo,
    ListUsers,
    SearchMessages,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::PostMessage,
        ToolKind::GetChannelHistory,
        ToolKind::ListChannels,
        ToolKind::GetUserInfo,
        ToolKind::ListUsers,
        ToolKind::SearchMessages,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::PostMessage => "post_message",
            ToolKind::GetChannelHistory => "get_channel_history",
            ToolKind::ListChannels => "list_channels",
            ToolKind::GetUserInfo => "get_user_info",
            ToolKind::ListUsers => "list_users",
            ToolKind::SearchMessages => "search_messages",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    fn describe(self) -> ToolInfo {
        let (description, input_schema) = match self {
            ToolKind::PostMessage => (
                "Post a message to a Slack channel",
                json!({
                    "type": "object",
                    "properties": {
                        "channel": {
                            "type": "string",
                            "description": "Channel ID or name (e.g., #general, C1234567890)"
                        },
                        "text": {
                            "type": "string",
                            "description": "Message text to post"
                        },
                        "thread_ts": {
                            "type": "string",
                            "description": "Optional: Reply to a thread by providing the parent message timestamp"
                        }
                    },
                    "required": ["channel", "text"]
                }),
            ),
            ToolKind::GetChannelHistory => (
                "Get message history from a Slack channel",
                json!({
                    "type": "object",
                    "properties": {
                        "channel": {
                            "type": "string",
                            "description": "Channel ID or name (e.g., #general, C1234567890)"
                        },
                        "limit": {
                            "type": "integer",
                            "description": "Number of messages to retrieve (default: 50, max: 1000)",
                            "minimum": 1,
                            "maximum": 1000,
                            "default": 50
                        },
                        "oldest": {
                            "type": "string",
                            "description": "Optional: Only messages after this timestamp"
                        },
                        "latest": {
                            "type": "string",
                            "description": "Optional: Only messages before this timestamp"
                        }
                    },
                    "required": ["channel"]
                }),
            ),
            ToolKind::ListChannels => (
                "List all accessible Slack channels",
                json!({
                    "type": "object",
                    "properties": {
                        "exclude_archived": {
                            "type": "boolean",
                            "description": "Whether to exclude archived channels (default: true)",
                            "default": true
                        },
                        "limit": {
                            "type": "integer",
                            "description": "Maximum number of channels to return (default: 100)",
                            "minimum": 1,
                            "maximum": 1000,
                            "default": 100
                        }
                    },
                    "required": []
                }),
            ),
            ToolKind::GetUserInfo => (
                "Get information about a Slack user",
                json!({
                    "type": "object",
                    "properties": {
                        "user_id": {
                            "type": "string",
                            "description": "User ID (e.g., U1234567890)"
                        }
                    },
                    "required": ["user_id"]
                }),
            ),
            ToolKind::ListUsers => (
                "List all users in the Slack workspace",
                json!({
                    "type": "object",
                    "properties": {
                        "limit": {
                            "type": "integer",
                            "description": "Maximum number of users to return (default: 100)",
                            "minimum": 1,
                            "maximum": 1000,
                            "default": 100
                        }
                    },
                    "required": []
                }),
            ),
            ToolKind::SearchMessages => (
                "Search for messages in Slack (requires search scope)",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Search query (supports Slack search syntax)"
                        },
                        "count": {
                            "type": "integer",
                            "description": "Number of results to return (default: 20, max: 100)",
                            "minimum": 1,
                            "maximum": 100,
                            "default": 20
                        }
                    },
                    "required": ["query"]
                }),
            ),
        };
        ToolInfo {
            name: self.name().to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

// ── Tool arguments ──────────────────────────────────────────────────

fn default_history_limit() -> u32 {
    DEFAULT_HISTORY_LIMIT
}

fn default_list_limit() -> u32 {
    DEFAULT_LIST_LIMIT
}

fn default_search_count() -> u32 {
    DEFAULT_SEARCH_COUNT
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct PostMessageArgs {
    channel: String,
    text: String,
    #[serde(default)]
    thread_ts: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelHistoryArgs {
    channel: String,
    #[serde(default = "default_history_limit")]
    limit: u32,
    #[serde(default)]
    oldest: Option<String>,
    #[serde(default)]
    latest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListChannelsArgs {
    #[serde(default = "default_true")]
    exclude_archived: bool,
    #[serde(default = "default_list_limit")]
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct UserInfoArgs {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ListUsersArgs {
    #[serde(default = "default_list_limit")]
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct SearchMessagesArgs {
    query: String,
    #[serde(default = "default_search_count")]
    count: u32,
}

// ── Dispatch ────────────────────────────────────────────────────────

/// Internal outcome of one tool body. `Rejected` carries text that
/// becomes an error-flagged result (bad arguments, failed channel
/// resolution); `Client` is a classified API failure.
enum ToolError {
    Rejected(String),
    Client(ClientError),
}

impl From<ClientError> for ToolError {
    fn from(e: ClientError) -> Self {
        ToolError::Client(e)
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::Rejected(format!("Invalid arguments: {e}")))
}

fn check_limit(name: &str, value: u32, max: u32) -> Result<(), ToolError> {
    if value < 1 || value > max {
        return Err(ToolError::Rejected(format!(
            "{name} must be between 1 and {max}"
        )));
    }
    Ok(())
}

/// Resolves MCP tool calls against the Slack client.
pub struct ToolHandler {
    client: Arc<SlackClient>,
}

impl ToolHandler {
    pub fn new(client: Arc<SlackClient>) -> Self {
        Self { client }
    }

    /// The static tool catalog.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        ToolKind::ALL.into_iter().map(ToolKind::describe).collect()
    }

    /// Execute a tool by name.
    ///
    /// Always returns a result envelope: unknown names, invalid
    /// arguments, and API failures come back error-flagged with a
    /// readable explanation, never as an error value.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> CallToolResult {
        let Some(kind) = ToolKind::from_name(name) else {
            return error_result(format!("Unknown tool: {name}"));
        };

        // Hosts may omit arguments entirely; treat that as `{}`.
        let arguments = if arguments.is_null() {
            Value::Object(Default::default())
        } else {
            arguments
        };

        let outcome = match kind {
            ToolKind::PostMessage => self.post_message(arguments).await,
            ToolKind::GetChannelHistory => self.get_channel_history(arguments).await,
            ToolKind::ListChannels => self.list_channels(arguments).await,
            ToolKind::GetUserInfo => self.get_user_info(arguments).await,
            ToolKind::ListUsers => self.list_users(arguments).await,
            ToolKind::SearchMessages => self.search_messages(arguments),
        };

        match outcome {
            Ok(text) => text_result(text),
            Err(ToolError::Rejected(text)) => error_result(text),
            Err(ToolError::Client(e)) => {
                error!(tool = %name, error = %e, "Slack API error in tool");
                error_result(format!("Slack API error: {e}"))
            }
        }
    }

    /// Accepts a raw channel id, or a `#name` resolved through a fresh
    /// listing with exact, case-sensitive name matching.
    async fn resolve_channel(&self, channel: &str) -> Result<String, ToolError> {
        let Some(name) = channel.strip_prefix('#') else {
            return Ok(channel.to_string());
        };
        let channels = self.client.list_channels(DEFAULT_LIST_LIMIT, true).await?;
        channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id.clone())
            .ok_or_else(|| ToolError::Rejected(format!("Channel #{name} not found")))
    }

    async fn post_message(&self, arguments: Value) -> Result<String, ToolError> {
        let args: PostMessageArgs = parse_args(arguments)?;
        let channel = self.resolve_channel(&args.channel).await?;

        let message = self
            .client
            .post_message(&channel, &args.text, args.thread_ts.as_deref())
            .await?;

        Ok(format!(
            "Message posted successfully to channel {channel}\nTimestamp: {}\nText: {}",
            message.ts, message.text
        ))
    }

    async fn get_channel_history(&self, arguments: Value) -> Result<String, ToolError> {
        let args: ChannelHistoryArgs = parse_args(arguments)?;
        check_limit("limit", args.limit, MAX_LIST_LIMIT)?;
        let channel = self.resolve_channel(&args.channel).await?;

        let messages = self
            .client
            .get_channel_history(
                &channel,
                args.limit,
                args.oldest.as_deref(),
                args.latest.as_deref(),
            )
            .await?;

        let mut lines = Vec::new();
        for msg in &messages {
            let author = match &msg.user {
                // Author lookup is best-effort; fall back to the raw id.
                Some(user_id) => match self.client.get_user_info(user_id).await {
                    Ok(user) => format!(" ({})", user.label()),
                    Err(_) => format!(" ({user_id})"),
                },
                None => String::new(),
            };
            let mut line = format!("[{}]{}: {}", msg.ts, author, msg.text);
            if let Some(thread_ts) = &msg.thread_ts {
                line.push_str(&format!(" (reply to {thread_ts})"));
            }
            lines.push(line);
        }

        Ok(format!(
            "Retrieved {} messages from channel {channel}:\n\n{}",
            messages.len(),
            lines.join("\n")
        ))
    }

    async fn list_channels(&self, arguments: Value) -> Result<String, ToolError> {
        let args: ListChannelsArgs = parse_args(arguments)?;
        check_limit("limit", args.limit, MAX_LIST_LIMIT)?;

        let channels = self
            .client
            .list_channels(args.limit, args.exclude_archived)
            .await?;

        let lines: Vec<String> = channels
            .iter()
            .map(|c| {
                let privacy = if c.is_private { "private" } else { "public" };
                let archived = if c.is_archived { " (archived)" } else { "" };
                let topic = c
                    .topic
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .map(|t| format!(" - {t}"))
                    .unwrap_or_default();
                format!("#{} ({privacy}){archived}{topic}", c.name)
            })
            .collect();

        Ok(format!(
            "Found {} channels:\n\n{}",
            channels.len(),
            lines.join("\n")
        ))
    }

    async fn get_user_info(&self, arguments: Value) -> Result<String, ToolError> {
        let args: UserInfoArgs = parse_args(arguments)?;
        let user = self.client.get_user_info(&args.user_id).await?;

        Ok(format!(
            "User Information:\n\
             ID: {}\n\
             Username: {}\n\
             Real Name: {}\n\
             Display Name: {}\n\
             Email: {}\n\
             Is Bot: {}\n\
             Is Admin: {}\n\
             Timezone: {}",
            user.id,
            user.name,
            user.real_name.as_deref().unwrap_or("N/A"),
            user.display_name.as_deref().unwrap_or("N/A"),
            user.email.as_deref().unwrap_or("N/A"),
            user.is_bot,
            user.is_admin,
            user.timezone.as_deref().unwrap_or("N/A"),
        ))
    }

    async fn list_users(&self, arguments: Value) -> Result<String, ToolError> {
        let args: ListUsersArgs = parse_args(arguments)?;
        check_limit("limit", args.limit, MAX_LIST_LIMIT)?;

        let users = self.client.list_users(args.limit).await?;

        let lines: Vec<String> = users
            .iter()
            .map(|u| {
                let bot = if u.is_bot { " (bot)" } else { "" };
                let admin = if u.is_admin { " (admin)" } else { "" };
                format!("{} (@{}){bot}{admin}", u.label(), u.name)
            })
            .collect();

        Ok(format!(
            "Found {} users:\n\n{}",
            users.len(),
            lines.join("\n")
        ))
    }

    /// Declared stub: search needs the `search:read` scope and the
    /// `search.messages` API, which this server does not call. The
    /// placeholder names the query so callers see the tool is wired
    /// up but unimplemented.
    fn search_messages(&self, arguments: Value) -> Result<String, ToolError> {
        let args: SearchMessagesArgs = parse_args(arguments)?;
        check_limit("count", args.count, MAX_SEARCH_COUNT)?;

        Ok(format!(
            "Message search is not yet implemented. Would search for: '{}' (limit: {})",
            args.query, args.count
        ))
    }
}

fn text_result(text: String) -> CallToolResult {
    CallToolResult {
        content: vec![ToolContent::Text { text }],
        is_error: false,
    }
}

fn error_result(text: String) -> CallToolResult {
    CallToolResult {
        content: vec![ToolContent::Text { text }],
        is_error: true,
    }
}
