//! MCP server loop.
//!
//! Binds the resource and tool handlers to the protocol verbs and
//! wraps every outcome in the JSON-RPC envelope. Handlers are built
//! not to fail; the serialization steps here are still checked so a
//! defect degrades to an error response instead of faulting the loop.

use std::sync::Arc;

use serde_json::Value;

use slack_mcp_client::SlackClient;
use slack_mcp_core::config::McpConfig;

use crate::error::McpError;
use crate::resources::{mime_for_uri, ResourceHandler};
use crate::tools::ToolHandler;
use crate::transport::Transport;
use crate::types::*;

/// MCP server exposing one Slack workspace.
///
/// Holds the long-lived client handle shared by both handlers and no
/// other state; every verb invocation is one-shot.
pub struct McpServer {
    resources: ResourceHandler,
    tools: ToolHandler,
    server_name: String,
    server_version: String,
}

impl McpServer {
    /// Create a server around a shared Slack client.
    pub fn new(client: Arc<SlackClient>, mcp: McpConfig) -> Self {
        Self {
            resources: ResourceHandler::new(client.clone()),
            tools: ToolHandler::new(client),
            server_name: mcp.server_name,
            server_version: mcp.server_version,
        }
    }

    /// Run the request loop until the transport closes.
    pub async fn run<T: Transport>(&mut self, transport: &mut T) -> Result<(), McpError> {
        tracing::info!(server = %self.server_name, "MCP server starting");

        loop {
            let line = match transport.receive().await? {
                Some(line) => line,
                None => {
                    tracing::info!("Transport closed, shutting down");
                    break;
                }
            };

            tracing::debug!(message = %line, "Received message");

            // Distinguish requests (have "id") from notifications (no
            // "id") by parsing as generic Value first.
            let raw: Value = match serde_json::from_str(&line) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse JSON");
                    let resp = parse_failure_response(e);
                    transport.send(&serde_json::to_string(&resp)?).await?;
                    continue;
                }
            };

            if raw.get("id").is_none() {
                if let Ok(notif) = serde_json::from_value::<JsonRpcNotification>(raw) {
                    self.handle_notification(&notif);
                }
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_value(raw) {
                Ok(req) => req,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse JSON-RPC request");
                    let resp = parse_failure_response(e);
                    transport.send(&serde_json::to_string(&resp)?).await?;
                    continue;
                }
            };

            let response = self.handle_request(&request).await;
            let json = serde_json::to_string(&response)?;
            tracing::debug!(response = %json, "Sending response");
            transport.send(&json).await?;
        }

        Ok(())
    }

    /// Handle a single JSON-RPC request and produce a response.
    pub async fn handle_request(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "resources/list" => self.handle_list_resources(id).await,
            "resources/read" => self.handle_read_resource(id, &request.params).await,
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, &request.params).await,
            method => {
                tracing::warn!(method = %method, "Unknown method");
                let err = McpError::MethodNotFound(method.to_string());
                JsonRpcResponse::error(id, err.to_rpc_error().code, err.to_string())
            }
        }
    }

    fn handle_notification(&self, notif: &JsonRpcNotification) {
        match notif.method.as_str() {
            "notifications/initialized" => {
                tracing::info!("Client confirmed initialization");
            }
            "notifications/cancelled" => {
                tracing::debug!("Client cancelled a request");
            }
            method => {
                tracing::debug!(method = %method, "Unknown notification, ignoring");
            }
        }
    }

    fn handle_initialize(&self, id: RpcId) -> JsonRpcResponse {
        tracing::info!("Handling initialize");

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                resources: Some(ResourcesCapability::default()),
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: self.server_name.clone(),
                version: Some(self.server_version.clone()),
            },
        };

        success_or_internal(id, &result)
    }

    async fn handle_list_resources(&self, id: RpcId) -> JsonRpcResponse {
        tracing::debug!("Handling resources/list");

        let resources = self.resources.list_resources().await;
        let result = ListResourcesResult {
            resources,
            next_cursor: None,
        };

        success_or_internal(id, &result)
    }

    async fn handle_read_resource(&self, id: RpcId, params: &Option<Value>) -> JsonRpcResponse {
        let params = match parse_params::<ReadResourceParams>(params) {
            Ok(p) => p,
            Err(e) => return JsonRpcResponse::error(id, e.to_rpc_error().code, e.to_string()),
        };

        tracing::debug!(uri = %params.uri, "Handling resources/read");

        let text = self.resources.read_resource(&params.uri).await;
        let result = ReadResourceResult {
            contents: vec![ResourceContents {
                mime_type: mime_for_uri(&params.uri).to_string(),
                uri: params.uri,
                text,
            }],
        };

        success_or_internal(id, &result)
    }

    fn handle_list_tools(&self, id: RpcId) -> JsonRpcResponse {
        tracing::debug!("Handling tools/list");

        let result = ListToolsResult {
            tools: self.tools.list_tools(),
            next_cursor: None,
        };

        success_or_internal(id, &result)
    }

    async fn handle_call_tool(&self, id: RpcId, params: &Option<Value>) -> JsonRpcResponse {
        let params = match parse_params::<CallToolParams>(params) {
            Ok(p) => p,
            Err(e) => return JsonRpcResponse::error(id, e.to_rpc_error().code, e.to_string()),
        };

        tracing::debug!(tool = %params.name, "Handling tools/call");

        let result = self.tools.call_tool(&params.name, params.arguments).await;
        success_or_internal(id, &result)
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: &Option<Value>) -> Result<T, McpError> {
    let params = params
        .as_ref()
        .ok_or_else(|| McpError::InvalidParams("missing params".to_string()))?;
    serde_json::from_value(params.clone()).map_err(|e| McpError::InvalidParams(e.to_string()))
}

fn success_or_internal<T: serde::Serialize>(id: RpcId, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(val) => JsonRpcResponse::success(id, val),
        Err(e) => {
            let err = McpError::JsonParse(e);
            JsonRpcResponse::error(id, err.to_rpc_error().code, err.to_string())
        }
    }
}

fn parse_failure_response(e: serde_json::Error) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id: RpcId::Number(0),
        result: None,
        error: Some(McpError::JsonParse(e).to_rpc_error()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_server() -> McpServer {
        let client = Arc::new(SlackClient::with_base_url(
            "xoxb-test",
            // Closed port: any handler that reaches for the API fails
            // fast with a classified client error.
            "http://127.0.0.1:9",
        ));
        McpServer::new(
            client,
            McpConfig {
                server_name: "slack-mcp-server".to_string(),
                server_version: "0.1.0".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_handle_initialize() {
        let server = test_server();
        let req = JsonRpcRequest::new(
            RpcId::Number(1),
            "initialize",
            Some(serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {"name": "test-client"}
            })),
        );

        let resp = server.handle_request(&req).await;
        assert!(resp.error.is_none());
        let result: InitializeResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.protocol_version, PROTOCOL_VERSION);
        assert_eq!(result.server_info.name, "slack-mcp-server");
        assert!(result.capabilities.resources.is_some());
        assert!(result.capabilities.tools.is_some());
    }

    #[tokio::test]
    async fn test_handle_list_tools() {
        let server = test_server();
        let req = JsonRpcRequest::new(RpcId::Number(2), "tools/list", None);

        let resp = server.handle_request(&req).await;
        assert!(resp.error.is_none());
        let result: ListToolsResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.tools.len(), 6);
        assert!(result.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_list_resources_degrades_to_error_resource() {
        // The API base is unreachable, so enumeration fails and the
        // listing collapses to the single synthetic error entry.
        let server = test_server();
        let req = JsonRpcRequest::new(RpcId::Number(3), "resources/list", None);

        let resp = server.handle_request(&req).await;
        assert!(resp.error.is_none());
        let result: ListResourcesResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.resources.len(), 1);
        assert_eq!(result.resources[0].uri, "slack://error");
        assert_eq!(result.resources[0].mime_type, "text/plain");
    }

    #[tokio::test]
    async fn test_read_unknown_uri_returns_error_text_not_fault() {
        let server = test_server();
        let req = JsonRpcRequest::new(
            RpcId::Number(4),
            "resources/read",
            Some(serde_json::json!({"uri": "slack://nonsense"})),
        );

        let resp = server.handle_request(&req).await;
        assert!(resp.error.is_none());
        let result: ReadResourceResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.contents.len(), 1);
        assert!(result.contents[0]
            .text
            .contains("Unknown resource URI: slack://nonsense"));
    }

    #[tokio::test]
    async fn test_call_tool_missing_params_is_invalid_params() {
        let server = test_server();
        let req = JsonRpcRequest::new(RpcId::Number(5), "tools/call", None);

        let resp = server.handle_request(&req).await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_handle_unknown_method() {
        let server = test_server();
        let req = JsonRpcRequest::new(RpcId::Number(6), "prompts/list", None);

        let resp = server.handle_request(&req).await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_server_run_with_duplex_transport() {
        use crate::transport::{DuplexTransport, Transport};

        let (mut client_side, mut server_side) = DuplexTransport::pair();
        let mut server = test_server();

        let server_handle = tokio::spawn(async move { server.run(&mut server_side).await });

        let init_req = JsonRpcRequest::new(
            RpcId::Number(1),
            "initialize",
            Some(serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {"name": "test"}
            })),
        );
        client_side
            .send(&serde_json::to_string(&init_req).unwrap())
            .await
            .unwrap();

        let resp_line = client_side.receive().await.unwrap().unwrap();
        let resp: JsonRpcResponse = serde_json::from_str(&resp_line).unwrap();
        assert!(resp.error.is_none());

        // The search stub answers without the API, so the full loop
        // can be exercised against an unreachable base.
        let call_req = JsonRpcRequest::new(
            RpcId::Number(2),
            "tools/call",
            Some(serde_json::json!({
                "name": "search_messages",
                "arguments": {"query": "release notes"}
            })),
        );
        client_side
            .send(&serde_json::to_string(&call_req).unwrap())
            .await
            .unwrap();

        let resp_line = client_side.receive().await.unwrap().unwrap();
        let resp: JsonRpcResponse = serde_json::from_str(&resp_line).unwrap();
        let result: CallToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert!(!result.is_error);
        match &result.content[0] {
            ToolContent::Text { text } => assert!(text.contains("release notes")),
        }

        // Malformed JSON still gets a parse-error response.
        client_side.send("{not json").await.unwrap();
        let resp_line = client_side.receive().await.unwrap().unwrap();
        let resp: JsonRpcResponse = serde_json::from_str(&resp_line).unwrap();
        assert_eq!(resp.error.unwrap().code, error_codes::PARSE_ERROR);

        drop(client_side);
        server_handle.await.unwrap().unwrap();
    }
}
