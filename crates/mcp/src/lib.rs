//! MCP (Model Context Protocol) adapter for Slack.
//!
//! Exposes a Slack workspace over JSON-RPC 2.0 as MCP resources
//! (read-only `slack://` documents) and tools (schema-validated
//! actions), backed by the `slack-mcp-client` API facade.
//!
//! # Architecture
//!
//! - **types**: JSON-RPC 2.0 and MCP wire types
//! - **transport**: newline-delimited JSON transport (stdio, in-memory duplex)
//! - **resources**: `slack://` URI grammar and resource documents
//! - **tools**: tool catalog and dispatch
//! - **server**: request loop binding the handlers to the protocol verbs
//! - **error**: protocol-level errors
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use slack_mcp_client::SlackClient;
//! use slack_mcp_core::config::McpConfig;
//! use slack_mcp_protocol::server::McpServer;
//! use slack_mcp_protocol::transport::StdioTransport;
//!
//! # async fn example(mcp_config: McpConfig) {
//! let client = Arc::new(SlackClient::new("xoxb-..."));
//! let mut server = McpServer::new(client, mcp_config);
//! let mut transport = StdioTransport::new();
//! server.run(&mut transport).await.unwrap();
//! # }
//! ```

pub mod error;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;
pub mod types;

pub use error::McpError;
pub use resources::{ResourceHandler, ResourceUri};
pub use server::McpServer;
pub use tools::{ToolHandler, ToolKind};
pub use transport::{DuplexTransport, StdioTransport, Transport};
pub use types::*;
