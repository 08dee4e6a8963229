//! Error types for the protocol crate.
//!
//! These cover the JSON-RPC rim only. Handler failures never surface
//! here: resource reads render error text and tool calls return
//! error-flagged results instead.

use crate::types::{error_codes, JsonRpcError};

/// Errors that can occur while speaking the protocol.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// Failed to parse or serialize JSON.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Transport I/O error.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The requested method is not supported.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Invalid parameters for a method.
    #[error("Invalid params: {0}")]
    InvalidParams(String),
}

impl McpError {
    /// Convert to a JSON-RPC error object.
    pub fn to_rpc_error(&self) -> JsonRpcError {
        let code = match self {
            McpError::JsonParse(_) => error_codes::PARSE_ERROR,
            McpError::MethodNotFound(_) => error_codes::METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => error_codes::INVALID_PARAMS,
            McpError::Transport(_) => error_codes::INTERNAL_ERROR,
        };
        JsonRpcError {
            code,
            message: self.to_string(),
            data: None,
        }
    }
}
