use serde_json::{json, Value};
use tracing::{debug, error};

use slack_mcp_core::{Channel, JsonObject, Message, User, Workspace};

use crate::error::ClientError;

const DEFAULT_BASE_URL: &str = "https://slack.com/api";

/// Pagination guard. A well-behaved workspace drains its cursor long
/// before this; an API that keeps handing back a non-empty cursor is
/// treated as broken instead of being looped on forever.
pub const MAX_PAGES: usize = 1000;

/// Identity of the authenticated token, from `auth.test`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct AuthInfo {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
}

/// Slack Web API client.
///
/// Wraps a shared `reqwest::Client` and a bearer token. All listing
/// operations paginate to completion before returning; all responses
/// are checked for the `ok` envelope flag.
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl SlackClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Point the client at a different API root. Used by tests to
    /// stand in a local fake for `slack.com`.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Verify the token and report who it authenticates as.
    pub async fn test_auth(&self) -> Result<AuthInfo, ClientError> {
        let body = self.call_get("auth.test", &[]).await?;
        serde_json::from_value(body).map_err(|e| ClientError::Parse {
            method: "auth.test".to_string(),
            detail: e.to_string(),
        })
    }

    /// Fetch workspace (team) information.
    pub async fn get_workspace_info(&self) -> Result<Workspace, ClientError> {
        let body = self.call_get("team.info", &[]).await?;
        let team = body
            .get("team")
            .ok_or_else(|| parse_error("team.info", "missing team"))?;
        Ok(Workspace {
            id: required_str(team, "id", "team.info")?,
            name: required_str(team, "name", "team.info")?,
            domain: required_str(team, "domain", "team.info")?,
            email_domain: opt_str(team, "email_domain"),
            icon: opt_object(team, "icon"),
            enterprise_id: opt_str(team, "enterprise_id"),
            enterprise_name: opt_str(team, "enterprise_name"),
        })
    }

    /// List every channel the token can see, across all pages.
    pub async fn list_channels(
        &self,
        limit: u32,
        exclude_archived: bool,
    ) -> Result<Vec<Channel>, ClientError> {
        let mut channels = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut params = vec![
                ("limit", limit.to_string()),
                ("exclude_archived", exclude_archived.to_string()),
                ("types", "public_channel,private_channel".to_string()),
            ];
            if let Some(ref c) = cursor {
                params.push(("cursor", c.clone()));
            }

            let body = self.call_get("conversations.list", &params).await?;
            let page = body
                .get("channels")
                .and_then(Value::as_array)
                .ok_or_else(|| parse_error("conversations.list", "missing channels"))?;
            for item in page {
                channels.push(channel_from_api(item)?);
            }

            cursor = next_cursor(&body);
            if cursor.is_none() {
                return Ok(channels);
            }
        }

        Err(ClientError::PaginationLimit {
            method: "conversations.list".to_string(),
            pages: MAX_PAGES,
        })
    }

    /// Fetch one page of message history from a channel.
    pub async fn get_channel_history(
        &self,
        channel_id: &str,
        limit: u32,
        oldest: Option<&str>,
        latest: Option<&str>,
    ) -> Result<Vec<Message>, ClientError> {
        let mut params = vec![
            ("channel", channel_id.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(oldest) = oldest {
            params.push(("oldest", oldest.to_string()));
        }
        if let Some(latest) = latest {
            params.push(("latest", latest.to_string()));
        }

        let body = self.call_get("conversations.history", &params).await?;
        let page = body
            .get("messages")
            .and_then(Value::as_array)
            .ok_or_else(|| parse_error("conversations.history", "missing messages"))?;

        page.iter()
            .map(|item| message_from_api(channel_id, item))
            .collect()
    }

    /// Post a message. The only mutating call; it carries no
    /// client-side deduplication token, so a caller that retries a
    /// failed post may deliver twice.
    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<Message, ClientError> {
        let mut payload = json!({
            "channel": channel,
            "text": text,
        });
        if let Some(thread_ts) = thread_ts {
            payload["thread_ts"] = json!(thread_ts);
        }

        let body = self.call_post("chat.postMessage", &payload).await?;
        let msg = body
            .get("message")
            .ok_or_else(|| parse_error("chat.postMessage", "missing message"))?;
        message_from_api(channel, msg)
    }

    /// Fetch a single user.
    pub async fn get_user_info(&self, user_id: &str) -> Result<User, ClientError> {
        let params = [("user", user_id.to_string())];
        let body = self.call_get("users.info", &params).await?;
        let user = body
            .get("user")
            .ok_or_else(|| parse_error("users.info", "missing user"))?;
        user_from_api(user)
    }

    /// List all non-deleted users in the workspace, across all pages.
    pub async fn list_users(&self, limit: u32) -> Result<Vec<User>, ClientError> {
        let mut users = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut params = vec![("limit", limit.to_string())];
            if let Some(ref c) = cursor {
                params.push(("cursor", c.clone()));
            }

            let body = self.call_get("users.list", &params).await?;
            let page = body
                .get("members")
                .and_then(Value::as_array)
                .ok_or_else(|| parse_error("users.list", "missing members"))?;
            for item in page {
                if item.get("deleted").and_then(Value::as_bool).unwrap_or(false) {
                    continue;
                }
                users.push(user_from_api(item)?);
            }

            cursor = next_cursor(&body);
            if cursor.is_none() {
                return Ok(users);
            }
        }

        Err(ClientError::PaginationLimit {
            method: "users.list".to_string(),
            pages: MAX_PAGES,
        })
    }

    // ── Request plumbing ────────────────────────────────────────────

    async fn call_get(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<Value, ClientError> {
        let url = format!("{}/{}", self.base_url, method);
        debug!(method = %method, "Slack API request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .await?;

        self.check_envelope(method, response).await
    }

    async fn call_post(&self, method: &str, payload: &Value) -> Result<Value, ClientError> {
        let url = format!("{}/{}", self.base_url, method);
        debug!(method = %method, "Slack API request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await?;

        self.check_envelope(method, response).await
    }

    async fn check_envelope(
        &self,
        method: &str,
        response: reqwest::Response,
    ) -> Result<Value, ClientError> {
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            error!(method = %method, status, "Slack API HTTP failure");
            return Err(ClientError::Status { status, body });
        }

        let body: Value = response.json().await?;
        if body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            Ok(body)
        } else {
            let code = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error")
                .to_string();
            error!(method = %method, code = %code, "Slack API error");
            Err(ClientError::Api {
                method: method.to_string(),
                code,
            })
        }
    }
}

// ── Field projection ────────────────────────────────────────────────
//
// Every optional field defaults instead of failing: missing nested
// objects map to None, missing booleans to false. Only the natural
// keys (id, name, ts) are required.

fn parse_error(method: &str, detail: &str) -> ClientError {
    ClientError::Parse {
        method: method.to_string(),
        detail: detail.to_string(),
    }
}

fn required_str(v: &Value, key: &str, method: &str) -> Result<String, ClientError> {
    v.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| parse_error(method, &format!("missing {key}")))
}

fn opt_str(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(Value::as_str).map(str::to_string)
}

fn flag(v: &Value, key: &str) -> bool {
    v.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn opt_object(v: &Value, key: &str) -> Option<JsonObject> {
    v.get(key).and_then(Value::as_object).cloned()
}

fn objects(v: &Value, key: &str) -> Vec<JsonObject> {
    v.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Topic and purpose arrive as `{"value": "...", ...}` sub-objects.
fn nested_value(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(|o| o.get("value"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn next_cursor(body: &Value) -> Option<String> {
    body.get("response_metadata")
        .and_then(|m| m.get("next_cursor"))
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

fn channel_from_api(v: &Value) -> Result<Channel, ClientError> {
    Ok(Channel {
        id: required_str(v, "id", "conversations.list")?,
        name: required_str(v, "name", "conversations.list")?,
        is_private: flag(v, "is_private"),
        is_archived: flag(v, "is_archived"),
        is_general: flag(v, "is_general"),
        topic: nested_value(v, "topic"),
        purpose: nested_value(v, "purpose"),
        member_count: v.get("num_members").and_then(Value::as_u64).map(|n| n as u32),
    })
}

fn message_from_api(channel_id: &str, v: &Value) -> Result<Message, ClientError> {
    Ok(Message {
        ts: required_str(v, "ts", "conversations.history")?,
        channel: channel_id.to_string(),
        user: opt_str(v, "user"),
        text: opt_str(v, "text").unwrap_or_default(),
        thread_ts: opt_str(v, "thread_ts"),
        reply_count: v
            .get("reply_count")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32,
        reactions: objects(v, "reactions"),
        attachments: objects(v, "attachments"),
        files: objects(v, "files"),
        edited: opt_object(v, "edited"),
        permalink: opt_str(v, "permalink"),
    })
}

fn user_from_api(v: &Value) -> Result<User, ClientError> {
    let profile = v.get("profile");
    Ok(User {
        id: required_str(v, "id", "users.list")?,
        name: required_str(v, "name", "users.list")?,
        real_name: opt_str(v, "real_name"),
        display_name: profile.and_then(|p| opt_str(p, "display_name")),
        email: profile.and_then(|p| opt_str(p, "email")),
        is_bot: flag(v, "is_bot"),
        is_admin: flag(v, "is_admin"),
        timezone: opt_str(v, "tz"),
        profile_image: profile.and_then(|p| opt_str(p, "image_72")),
    })
}
