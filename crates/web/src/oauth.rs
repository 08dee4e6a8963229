//! Slack OAuth 2.0 authorization-code flow.
//!
//! Runs a short-lived local HTTP listener: a landing page with the
//! authorization link, and the callback that validates the `state`
//! nonce and exchanges the code for a bot token. The flow resolves
//! with the token, or `None` if the user never completes it.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info};
use url::Url;

use slack_mcp_core::{Config, ConfigError};

const SLACK_AUTHORIZE_URL: &str = "https://slack.com/oauth/v2/authorize";
const SLACK_API_BASE: &str = "https://slack.com/api";
const OAUTH_SCOPES: &str = "channels:read,groups:read,chat:write,users:read,team:read";

/// How long the flow waits for the user to finish in the browser.
const FLOW_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token exchange failed: {0}")]
    Exchange(String),
}

struct FlowState {
    config: Config,
    http: reqwest::Client,
    api_base: String,
    expected_state: String,
    // Consumed by the first successful callback.
    token_tx: Mutex<Option<oneshot::Sender<String>>>,
}

/// Run the complete flow against the real Slack endpoints.
pub async fn run_oauth_flow(config: &Config) -> Result<Option<String>, OAuthError> {
    run_flow(config, SLACK_API_BASE).await
}

async fn run_flow(config: &Config, api_base: &str) -> Result<Option<String>, OAuthError> {
    config.validate_oauth()?;

    let (token_tx, token_rx) = oneshot::channel();
    let state = Arc::new(FlowState {
        config: config.clone(),
        http: reqwest::Client::new(),
        api_base: api_base.trim_end_matches('/').to_string(),
        expected_state: uuid::Uuid::new_v4().simple().to_string(),
        token_tx: Mutex::new(Some(token_tx)),
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local = listener.local_addr()?;

    info!(addr = %local, "OAuth flow listening");
    println!("Starting OAuth flow...");
    println!("Open http://{local} in your browser to authorize the application.");

    let router = oauth_router(state);
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "OAuth listener failed");
        }
    });

    let token = tokio::select! {
        token = token_rx => token.ok(),
        () = tokio::time::sleep(FLOW_TIMEOUT) => {
            info!("OAuth flow timed out");
            None
        }
    };

    // The listener only exists for this flow.
    server.abort();
    Ok(token)
}

fn oauth_router(state: Arc<FlowState>) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/auth/slack/callback", get(callback))
        .with_state(state)
}

/// Build the Slack authorization URL for this flow.
fn authorization_url(config: &Config, state: &str) -> String {
    let mut url = Url::parse(SLACK_AUTHORIZE_URL).expect("static URL");
    url.query_pairs_mut()
        .append_pair("client_id", config.slack.client_id.as_deref().unwrap_or(""))
        .append_pair("scope", OAUTH_SCOPES)
        .append_pair("redirect_uri", &config.redirect_uri())
        .append_pair("state", state)
        .append_pair("response_type", "code");
    url.to_string()
}

async fn landing(State(state): State<Arc<FlowState>>) -> Html<String> {
    let auth_url = authorization_url(&state.config, &state.expected_state);
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Slack MCP Server OAuth</title></head>
<body>
  <h1>Slack MCP Server OAuth</h1>
  <p>Click the link below to authorize this application with your Slack workspace:</p>
  <p><a href="{auth_url}">Add to Slack</a></p>
  <p><small>This will redirect you to Slack to authorize the application.</small></p>
</body>
</html>
"#
    ))
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

async fn callback(
    State(state): State<Arc<FlowState>>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<String>) {
    if let Some(error) = params.error {
        error!(error = %error, "OAuth error from provider");
        return error_page(StatusCode::BAD_REQUEST, &format!("Error: {error}"));
    }

    let Some(code) = params.code else {
        error!("No authorization code received");
        return error_page(StatusCode::BAD_REQUEST, "No authorization code received");
    };

    if params.state.as_deref() != Some(state.expected_state.as_str()) {
        error!("Invalid state parameter");
        return error_page(StatusCode::BAD_REQUEST, "Invalid state parameter");
    }

    match exchange_code(&state.http, &state.api_base, &state.config, &code).await {
        Ok(token) => {
            if let Some(tx) = state.token_tx.lock().await.take() {
                let _ = tx.send(token);
            }
            (
                StatusCode::OK,
                Html(
                    "<h1>Success!</h1>\
                     <p>Authorization successful. You can now close this window \
                     and return to your terminal.</p>"
                        .to_string(),
                ),
            )
        }
        Err(e) => {
            error!(error = %e, "Token exchange error");
            error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Token exchange failed: {e}"),
            )
        }
    }
}

fn error_page(status: StatusCode, detail: &str) -> (StatusCode, Html<String>) {
    (status, Html(format!("<h1>OAuth Error</h1><p>{detail}</p>")))
}

/// Exchange an authorization code for a bot token.
async fn exchange_code(
    http: &reqwest::Client,
    api_base: &str,
    config: &Config,
    code: &str,
) -> Result<String, OAuthError> {
    let form = [
        (
            "client_id",
            config.slack.client_id.clone().unwrap_or_default(),
        ),
        (
            "client_secret",
            config.slack.client_secret.clone().unwrap_or_default(),
        ),
        ("code", code.to_string()),
        ("redirect_uri", config.redirect_uri()),
    ];

    let response = http
        .post(format!("{api_base}/oauth.v2.access"))
        .form(&form)
        .send()
        .await?;

    let status = response.status().as_u16();
    if status != 200 {
        return Err(OAuthError::Exchange(format!("status {status}")));
    }

    let body: Value = response.json().await?;
    if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        let code = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error");
        return Err(OAuthError::Exchange(code.to_string()));
    }

    body.get("access_token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| OAuthError::Exchange("missing access_token".to_string()))
}
