//! Request dispatch: routes JSON-RPC methods to the tool host.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo,
    ToolsCapability,
};
use crate::tool::{ToolError, ToolHost};

/// Protocol version answered when the client asks for one we don't know.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// Protocol versions this server can speak.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

/// Dispatches MCP requests to a [`ToolHost`].
///
/// Holds no per-call state, so one instance is shared by every session.
pub struct Dispatcher<H> {
    host: H,
    info: ServerInfo,
    instructions: Option<String>,
}

impl<H: ToolHost> Dispatcher<H> {
    pub fn new(host: H, info: ServerInfo) -> Self {
        Self {
            host,
            info,
            instructions: None,
        }
    }

    /// Usage hints returned to the client in the `initialize` result.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Handle one raw JSON-RPC message.
    pub async fn handle_text(&self, text: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.handle_value(value).await,
            Err(e) => Some(JsonRpcResponse::failure(
                None,
                JsonRpcError::parse_error(e.to_string()),
            )),
        }
    }

    /// Handle one already-parsed JSON-RPC message.
    pub async fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle(request).await,
            Err(e) => Some(JsonRpcResponse::failure(
                None,
                JsonRpcError::invalid_request(e.to_string()),
            )),
        }
    }

    /// Handle a request. Notifications produce no response.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "notification received");
            return None;
        };

        debug!(method = %request.method, ?id, "request received");

        let outcome = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(json!({})),
            "tools/list" => to_result(ListToolsResult {
                tools: self.host.tools().to_vec(),
            }),
            "tools/call" => self.call_tool(request.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(Some(id), error),
        })
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = parse_params(params)?;

        let requested = params.protocol_version.as_str();
        let protocol_version = if SUPPORTED_PROTOCOL_VERSIONS.contains(&requested) {
            params.protocol_version
        } else {
            LATEST_PROTOCOL_VERSION.to_string()
        };

        if let Some(client) = &params.client_info {
            debug!(client = %client.name, %protocol_version, "client initialized");
        }

        to_result(InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: self.info.clone(),
            instructions: self.instructions.clone(),
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = parse_params(params)?;
        let arguments = params.arguments.unwrap_or(Value::Null);

        match self.host.execute(&params.name, arguments).await {
            Ok(result) => to_result(result),
            Err(e @ (ToolError::NotFound(_) | ToolError::InvalidInput(_))) => {
                Err(JsonRpcError::invalid_params(e.to_string()))
            }
            Err(ToolError::Execution(message)) => {
                warn!(tool = %params.name, %message, "tool execution failed");
                to_result(CallToolResult::error_text(message))
            }
        }
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("missing params"))?;
    serde_json::from_value(params).map_err(|e| JsonRpcError::invalid_params(e.to_string()))
}

fn to_result(value: impl Serialize) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal(e.to_string()))
}
