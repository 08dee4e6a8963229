use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Errors raised when required configuration is missing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    MissingVar(&'static str),
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub slack: SlackConfig,
    pub mcp: McpConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    pub bot_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    pub server_name: String,
    pub server_version: String,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_u16("PORT", 8000),
            },
            slack: SlackConfig {
                bot_token: env_opt("SLACK_BOT_TOKEN"),
                client_id: env_opt("SLACK_CLIENT_ID"),
                client_secret: env_opt("SLACK_CLIENT_SECRET"),
            },
            mcp: McpConfig {
                server_name: env_or("MCP_SERVER_NAME", "slack-mcp-server"),
                server_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            log_level: env_or("LOG_LEVEL", "info"),
        }
    }

    /// The OAuth redirect URI derived from the server binding.
    pub fn redirect_uri(&self) -> String {
        format!(
            "http://{}:{}/auth/slack/callback",
            self.server.host, self.server.port
        )
    }

    /// Check that the OAuth client credentials are configured.
    pub fn validate_oauth(&self) -> Result<(), ConfigError> {
        if self.slack.client_id.is_none() {
            return Err(ConfigError::MissingVar("SLACK_CLIENT_ID"));
        }
        if self.slack.client_secret.is_none() {
            return Err(ConfigError::MissingVar("SLACK_CLIENT_SECRET"));
        }
        Ok(())
    }
}
