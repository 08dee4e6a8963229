//! HTTP surfaces for the Slack MCP server.
//!
//! - **routes**: deployment health/status endpoints (Cloud Run style
//!   probes plus a couple of introspection routes)
//! - **oauth**: interactive OAuth 2.0 authorization-code flow that
//!   yields a bot token

pub mod oauth;
pub mod routes;

pub use oauth::{run_oauth_flow, OAuthError};
