pub mod greet;
pub mod health_check;
pub mod hello;
pub mod history;

use crate::config::ServerConfig;
use crate::protocol::{
    GetPromptParams, HelloParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ReadResourceParams, ToolCallParams, ToolResult,
};
use crate::schema;

/// Dispatch a JSON-RPC request to the appropriate handler.
///
/// Returns `None` for notifications (no response required).
pub async fn dispatch(req: &JsonRpcRequest, config: &ServerConfig) -> Option<JsonRpcResponse> {
    match req.method.as_str() {
        "initialize" => {
            let result = serde_json::json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {},
                    "resources": {},
                    "prompts": {}
                },
                "serverInfo": {
                    "name": "hello-mcp-server",
                    "version": env!("CARGO_PKG_VERSION")
                }
            });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        "notifications/initialized" => None,

        "ping" => Some(JsonRpcResponse::success(req.id.clone(), serde_json::json!({}))),

        "tools/list" => {
            let result = serde_json::json!({
                "tools": [
                    {
                        "name": "hello",
                        "description": "Say hello to someone",
                        "inputSchema": hello::input_schema()
                    },
                    {
                        "name": "health_check",
                        "description": "Check Gemini CLI health by running a simple test",
                        "inputSchema": health_check::input_schema()
                    }
                ]
            });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        "tools/call" => {
            let params: ToolCallParams = match &req.params {
                Some(v) => match serde_json::from_value(v.clone()) {
                    Ok(p) => p,
                    Err(e) => {
                        return Some(JsonRpcResponse::error(
                            req.id.clone(),
                            JsonRpcError::invalid_params(format!("Invalid tools/call params: {e}")),
                        ));
                    }
                },
                None => {
                    return Some(JsonRpcResponse::error(
                        req.id.clone(),
                        JsonRpcError::invalid_params("Missing params for tools/call"),
                    ));
                }
            };

            let tool_result = dispatch_tool_call(&params, config).await;
            let result_json = serde_json::to_value(&tool_result)
                .expect("ToolResult must serialize to JSON Value");
            Some(JsonRpcResponse::success(req.id.clone(), result_json))
        }

        "resources/list" => {
            let result = serde_json::json!({
                "resources": [
                    {
                        "uri": history::HISTORY_URI,
                        "name": "hello-world-history",
                        "description": "The origin story of the famous 'Hello, World' program",
                        "mimeType": "text/plain"
                    }
                ]
            });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        "resources/read" => {
            let params: ReadResourceParams = match parse_params(req) {
                Ok(p) => p,
                Err(err) => return Some(JsonRpcResponse::error(req.id.clone(), err)),
            };
            match history::handle(params).await {
                Ok(result) => Some(JsonRpcResponse::success(req.id.clone(), result)),
                Err(err) => Some(JsonRpcResponse::error(req.id.clone(), err)),
            }
        }

        "prompts/list" => {
            let result = serde_json::json!({
                "prompts": [
                    {
                        "name": "greet",
                        "description": "Say hello to someone",
                        "arguments": [
                            {
                                "name": "name",
                                "description": "Name of the person to greet",
                                "required": true
                            }
                        ]
                    }
                ]
            });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        "prompts/get" => {
            let params: GetPromptParams = match parse_params(req) {
                Ok(p) => p,
                Err(err) => return Some(JsonRpcResponse::error(req.id.clone(), err)),
            };
            match greet::handle(params).await {
                Ok(result) => Some(JsonRpcResponse::success(req.id.clone(), result)),
                Err(err) => Some(JsonRpcResponse::error(req.id.clone(), err)),
            }
        }

        _ => Some(JsonRpcResponse::error(
            req.id.clone(),
            JsonRpcError::method_not_found(&req.method),
        )),
    }
}

/// Deserialize `req.params` into the target type, mapping failures to
/// JSON-RPC invalid-params errors.
fn parse_params<T: serde::de::DeserializeOwned>(req: &JsonRpcRequest) -> Result<T, JsonRpcError> {
    match &req.params {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid {} params: {e}", req.method))),
        None => Err(JsonRpcError::invalid_params(format!(
            "Missing params for {}",
            req.method
        ))),
    }
}

async fn dispatch_tool_call(params: &ToolCallParams, config: &ServerConfig) -> ToolResult {
    // Missing arguments are treated as an empty object, matching clients
    // that omit `arguments` for zero-parameter tools.
    let args = params
        .arguments
        .clone()
        .unwrap_or_else(|| serde_json::json!({}));

    match params.name.as_str() {
        "hello" => {
            if let Err(e) = schema::validate_tool_args(&hello::input_schema(), &args) {
                return ToolResult::error(format!("Invalid arguments for hello: {e}"));
            }
            let hello_params: HelloParams = match serde_json::from_value(args) {
                Ok(p) => p,
                Err(e) => {
                    return ToolResult::error(format!("Invalid arguments for hello: {e}"));
                }
            };
            hello::handle(hello_params).await
        }

        "health_check" => {
            if let Err(e) = schema::validate_tool_args(&health_check::input_schema(), &args) {
                return ToolResult::error(format!("Invalid arguments for health_check: {e}"));
            }
            health_check::handle(config).await
        }

        _ => ToolResult::error(format!("Unknown tool: {}", params.name)),
    }
}
