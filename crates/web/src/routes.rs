//! Deployment web surface.
//!
//! Health and status endpoints for deployment probes. The health
//! check never calls Slack — probes have tight deadlines — it only
//! reports whether a token is configured.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use slack_mcp_client::SlackClient;
use slack_mcp_core::Config;

struct AppState {
    config: Config,
}

/// Build the public router.
pub fn router(config: Config) -> Router {
    let state = Arc::new(AppState { config });
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/slack/callback", get(oauth_placeholder))
        .route("/slack/info", get(slack_info))
        .route("/mcp/info", get(mcp_info))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "service": "Slack MCP Server",
        "version": state.config.mcp.server_version,
        "status": "running",
        "endpoints": {
            "health": "/health",
            "oauth": "/auth/slack/callback",
            "slack": "/slack/info",
            "mcp": "/mcp/info",
        }
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "slack_configured": state.config.slack.bot_token.is_some(),
    }))
}

async fn oauth_placeholder() -> Json<Value> {
    Json(json!({
        "message": "OAuth callback endpoint",
        "status": "run the server with --oauth to perform the authorization flow",
    }))
}

async fn slack_info(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let Some(token) = state.config.slack.bot_token.as_deref() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "SLACK_BOT_TOKEN not configured"})),
        );
    };

    let client = SlackClient::new(token);
    match client.get_workspace_info().await {
        Ok(workspace) => (
            StatusCode::OK,
            Json(json!({
                "workspace": workspace,
                "token_configured": true,
                "status": "connected",
            })),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": format!("Slack API error: {e}")})),
        ),
    }
}

async fn mcp_info() -> Json<Value> {
    Json(json!({
        "protocol": "Model Context Protocol",
        "version": "2024-11-05",
        "capabilities": {
            "resources": [
                "slack://channels",
                "slack://users",
                "slack://workspace",
            ],
            "tools": [
                "post_message",
                "get_channel_history",
                "list_channels",
                "get_user_info",
                "list_users",
                "search_messages",
            ]
        }
    }))
}
