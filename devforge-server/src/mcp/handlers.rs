// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! MCP Request Handlers
//!
//! Dispatches JSON-RPC 2.0 requests to the protocol, tool and resource
//! handlers.

use crate::mcp::context::PlatformContext;
use crate::mcp::protocol::*;
use crate::mcp::resources::{list_resources, read_resource};
use crate::mcp::tools::{register_platform_tools, RegistrationError, ToolContext, ToolError, ToolRegistry};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// MCP request handler
pub struct McpHandler {
    context: PlatformContext,
    tools: ToolRegistry,
}

impl McpHandler {
    /// Create a handler with the platform tool set registered.
    pub fn new(context: PlatformContext) -> Result<Self, RegistrationError> {
        let tools = ToolRegistry::new();
        register_platform_tools(&tools, &context)?;
        info!(tools = tools.len(), "MCP handler ready");
        Ok(Self { context, tools })
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Handle one incoming message. Notifications yield no response.
    pub async fn handle_message(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }
        Some(self.handle_request(request).await)
    }

    /// Like [`handle_message`](Self::handle_message), abandoning the request
    /// after `timeout`.
    pub async fn handle_with_timeout(
        &self,
        request: JsonRpcRequest,
        timeout: Duration,
    ) -> Option<JsonRpcResponse> {
        let id = request.id.clone();
        let method = request.method.clone();
        match tokio::time::timeout(timeout, self.handle_message(request)).await {
            Ok(response) => response,
            Err(_) => {
                warn!(%method, timeout_secs = timeout.as_secs(), "MCP request timed out");
                Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::internal_error(format!(
                        "Request timed out after {}s",
                        timeout.as_secs()
                    )),
                ))
            }
        }
    }

    /// Handle a JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %request.method, id = ?request.id, "MCP request received");

        if request.jsonrpc != JSONRPC_VERSION {
            return JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request(format!(
                    "Unsupported jsonrpc version: {}",
                    request.jsonrpc
                )),
            );
        }

        match request.method.as_str() {
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "initialize" => self.handle_initialize(request.id, request.params),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            "resources/list" => self.handle_resources_list(request.id),
            "resources/read" => self.handle_resources_read(request.id, request.params).await,
            _ => {
                warn!(method = %request.method, "Unknown MCP method");
                JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::method_not_found(format!("Method not found: {}", request.method)),
                )
            }
        }
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => info!("MCP client initialized"),
            other => debug!(method = %other, "Ignoring MCP notification"),
        }
    }

    fn handle_initialize(&self, id: JsonRpcId, params: Option<Value>) -> JsonRpcResponse {
        let init: InitializeParams = match parse(params, "initialize") {
            Ok(params) => params,
            Err(e) => return JsonRpcResponse::error(id, e),
        };
        info!(
            client = %init.client_info.name,
            client_version = %init.client_info.version,
            protocol_version = %init.protocol_version,
            "MCP client connecting"
        );

        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                resources: Some(ResourcesCapability {
                    subscribe: false,
                    list_changed: false,
                }),
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        respond(id, &result)
    }

    fn handle_tools_list(&self, id: JsonRpcId) -> JsonRpcResponse {
        respond(
            id,
            &ListToolsResult {
                tools: self.tools.list(),
            },
        )
    }

    async fn handle_tools_call(&self, id: JsonRpcId, params: Option<Value>) -> JsonRpcResponse {
        let call: CallToolParams = match parse(params, "tool call") {
            Ok(params) => params,
            Err(e) => return JsonRpcResponse::error(id, e),
        };

        let context = ToolContext {
            request_id: id.clone(),
        };
        match self
            .tools
            .execute(&call.name, Value::Object(call.arguments), &context)
            .await
        {
            Ok(result) => respond(id, &result),
            Err(ToolError::NotFound(name)) => {
                warn!(tool = %name, "Unknown MCP tool");
                JsonRpcResponse::error(id, JsonRpcError::method_not_found(format!("Unknown tool: {}", name)))
            }
            Err(ToolError::InvalidParams(message)) => {
                JsonRpcResponse::error(id, JsonRpcError::invalid_params(message))
            }
            Err(ToolError::Execution(message)) => {
                error!(tool = %call.name, error = %message, "MCP tool failed");
                JsonRpcResponse::error(
                    id,
                    JsonRpcError::internal_error(format!(
                        "Error executing tool {}: {}",
                        call.name, message
                    )),
                )
            }
        }
    }

    fn handle_resources_list(&self, id: JsonRpcId) -> JsonRpcResponse {
        respond(
            id,
            &ListResourcesResult {
                resources: list_resources(),
            },
        )
    }

    async fn handle_resources_read(&self, id: JsonRpcId, params: Option<Value>) -> JsonRpcResponse {
        let read: ReadResourceParams = match parse(params, "read") {
            Ok(params) => params,
            Err(e) => return JsonRpcResponse::error(id, e),
        };

        let body = match read_resource(&self.context, &read.uri).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Unknown resource: {}", read.uri)),
                )
            }
            Err(e) => {
                error!(uri = %read.uri, error = %e, "Resource access error");
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::internal_error(format!(
                        "Error accessing resource {}: {}",
                        read.uri, e
                    )),
                );
            }
        };

        let text = match serde_json::to_string_pretty(&body) {
            Ok(text) => text,
            Err(e) => return JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
        };
        respond(
            id,
            &ReadResourceResult {
                contents: vec![ResourceContent {
                    uri: read.uri,
                    mime_type: Some(JSON_MIME_TYPE.to_string()),
                    text,
                }],
            },
        )
    }
}

fn parse<T: DeserializeOwned>(params: Option<Value>, what: &str) -> Result<T, JsonRpcError> {
    let params =
        params.ok_or_else(|| JsonRpcError::invalid_params(format!("Missing {} params", what)))?;
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid {} params: {}", what, e)))
}

fn respond<T: Serialize>(id: JsonRpcId, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devforge_core::dashboard::StaticTelemetryFeed;
    use devforge_core::scoring::PlatformScorer;
    use devforge_core::store::{MemoryStore, PlatformSnapshot};
    use devforge_core::workflow::{ExecutorRegistry, NodeDelays, SimulationSettings, WorkflowRunner};
    use std::sync::Arc;

    fn handler() -> McpHandler {
        let snapshot: PlatformSnapshot = serde_json::from_value(json!({
            "teams": [{ "id": "t1", "name": "core", "displayName": "Core" }],
            "services": [
                { "id": "s1", "name": "user-service", "displayName": "User Service", "type": "SERVICE", "status": "ACTIVE", "ownerId": "t1" }
            ]
        }))
        .unwrap();
        let settings = SimulationSettings {
            delays: NodeDelays::none(),
            test_failure_rate: 0.0,
        };
        let context = PlatformContext::new(
            Arc::new(MemoryStore::new(snapshot)),
            Arc::new(StaticTelemetryFeed::default()),
            PlatformScorer::default(),
            WorkflowRunner::new(ExecutorRegistry::simulated(&settings)),
        );
        McpHandler::new(context).unwrap()
    }

    fn request(method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest::new(JsonRpcId::Number(1), method, params)
    }

    #[tokio::test]
    async fn test_ping() {
        let response = handler().handle_request(request("ping", None)).await;
        assert_eq!(response.result, Some(json!({})));
        assert_eq!(response.id, JsonRpcId::Number(1));
    }

    #[tokio::test]
    async fn test_initialize_requires_params() {
        let handler = handler();
        let response = handler.handle_request(request("initialize", None)).await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);

        let response = handler
            .handle_request(request(
                "initialize",
                Some(json!({
                    "protocolVersion": MCP_PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": { "name": "test", "version": "1.0" }
                })),
            ))
            .await;
        let result = response.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let handler = handler();
        let notification = JsonRpcRequest::new(JsonRpcId::Null, "notifications/initialized", None);
        assert!(handler.handle_message(notification).await.is_none());
        assert!(handler.handle_message(request("ping", None)).await.is_some());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = handler().handle_request(request("prompts/list", None)).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, METHOD_NOT_FOUND);
        assert_eq!(error.message, "Method not found: prompts/list");
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version() {
        let mut req = request("ping", None);
        req.jsonrpc = "1.0".to_string();
        let response = handler().handle_request(req).await;
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_tools_list_has_platform_tools() {
        let response = handler().handle_request(request("tools/list", None)).await;
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 8);
        assert!(tools.iter().any(|t| t["name"] == "execute_workflow"));
        assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let response = handler()
            .handle_request(request("tools/call", Some(json!({ "name": "natural_language_query" }))))
            .await;
        let error = response.error.unwrap();
        assert_eq!(error.code, METHOD_NOT_FOUND);
        assert_eq!(error.message, "Unknown tool: natural_language_query");
    }

    #[tokio::test]
    async fn test_schema_violation_is_invalid_params() {
        let response = handler()
            .handle_request(request(
                "tools/call",
                Some(json!({ "name": "get_service_info", "arguments": {} })),
            ))
            .await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tool_call_wraps_json_text() {
        let response = handler()
            .handle_request(request(
                "tools/call",
                Some(json!({ "name": "get_service_info", "arguments": { "serviceName": "USER-SERVICE" } })),
            ))
            .await;
        let result = response.result.unwrap();
        assert_eq!(result["content"][0]["type"], "text");
        let body: Value = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(body["basic"]["name"], "user-service");
    }

    #[tokio::test]
    async fn test_resources_read() {
        let handler = handler();
        let response = handler
            .handle_request(request(
                "resources/read",
                Some(json!({ "uri": "devforge://services/catalog" })),
            ))
            .await;
        let contents = &response.result.unwrap()["contents"][0];
        assert_eq!(contents["mimeType"], JSON_MIME_TYPE);
        let body: Value = serde_json::from_str(contents["text"].as_str().unwrap()).unwrap();
        assert_eq!(body["totalServices"], 1);

        let response = handler
            .handle_request(request("resources/read", Some(json!({ "uri": "devforge://unknown" }))))
            .await;
        let error = response.error.unwrap();
        assert_eq!(error.code, INVALID_PARAMS);
        assert_eq!(error.message, "Unknown resource: devforge://unknown");
    }
}
