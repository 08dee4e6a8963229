mod cli;

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{error, info};

use slack_mcp_client::SlackClient;
use slack_mcp_core::Config;
use slack_mcp_protocol::server::McpServer;
use slack_mcp_protocol::transport::StdioTransport;
use slack_mcp_web::run_oauth_flow;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Logs go to stderr: stdout is the protocol channel.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_level.clone())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    slack_mcp_core::config::load_dotenv();
    let config = Config::from_env();

    if args.oauth {
        return run_oauth(&config).await;
    }

    let token = match args.token.or_else(|| config.slack.bot_token.clone()) {
        Some(token) => token,
        None => {
            eprintln!("Error: No Slack token provided.");
            eprintln!();
            eprintln!("Options:");
            eprintln!("1. Run OAuth flow: slack-mcp-server --oauth");
            eprintln!("2. Set environment variable: export SLACK_BOT_TOKEN=your_token");
            eprintln!("3. Pass as argument: slack-mcp-server --token your_token");
            std::process::exit(1);
        }
    };

    run_server(&config, token).await
}

async fn run_server(config: &Config, token: String) -> Result<()> {
    let client = Arc::new(SlackClient::new(token));

    // Refuse to serve with a rejected token.
    match client.test_auth().await {
        Ok(auth) => info!(
            user = auth.user.as_deref().unwrap_or("unknown"),
            team = auth.team.as_deref().unwrap_or("unknown"),
            "Connected to Slack"
        ),
        Err(e) => {
            error!(error = %e, "Failed to connect to Slack. Please check your token.");
            bail!("Slack connection test failed: {e}");
        }
    }

    let mut server = McpServer::new(client, config.mcp.clone());
    let mut transport = StdioTransport::new();
    server.run(&mut transport).await?;
    Ok(())
}

async fn run_oauth(config: &Config) -> Result<()> {
    match run_oauth_flow(config).await? {
        Some(token) => {
            println!();
            println!("OAuth successful! Your bot token is: {token}");
            println!();
            println!("You can now run the server with:");
            println!("slack-mcp-server --token {token}");
            println!();
            println!("Or set the environment variable:");
            println!("export SLACK_BOT_TOKEN={token}");
            Ok(())
        }
        None => {
            eprintln!("OAuth flow was cancelled or timed out.");
            std::process::exit(1);
        }
    }
}
