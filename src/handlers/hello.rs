use crate::protocol::{HelloParams, ToolResult};

/// JSON Schema for the `hello` tool's arguments.
pub fn input_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["name"],
        "properties": {
            "name": {
                "type": "string",
                "description": "Name to greet"
            }
        }
    })
}

/// Handle a `hello` tool call.
pub async fn handle(params: HelloParams) -> ToolResult {
    ToolResult::text(format!("Hello, {}!", params.name))
}
