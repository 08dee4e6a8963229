//! Deployment entry point: serves the health/status surface.

use anyhow::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    slack_mcp_core::config::load_dotenv();
    let config = slack_mcp_core::Config::from_env();

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Web surface listening");

    axum::serve(listener, slack_mcp_web::routes::router(config)).await?;
    Ok(())
}
