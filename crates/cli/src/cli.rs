use clap::Parser;

/// Slack MCP Server - Model Context Protocol server for Slack integration.
#[derive(Debug, Parser)]
#[command(name = "slack-mcp-server", version)]
pub struct CliArgs {
    /// Slack bot token (can also be set via SLACK_BOT_TOKEN env var)
    #[arg(long)]
    pub token: Option<String>,

    /// Run OAuth flow to get a Slack token
    #[arg(long)]
    pub oauth: bool,

    /// Set logging level
    #[arg(long, default_value = "info", value_parser = ["debug", "info", "warn", "error"])]
    pub log_level: String,
}
