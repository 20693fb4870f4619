use serde::Deserialize;

use crate::protocol::{GetPromptParams, JsonRpcError};

/// Arguments for the `greet` prompt.
#[derive(Debug, Clone, Deserialize)]
struct GreetArgs {
    name: String,
}

/// Handle a `prompts/get` request for the `greet` prompt.
pub async fn handle(params: GetPromptParams) -> Result<serde_json::Value, JsonRpcError> {
    if params.name != "greet" {
        return Err(JsonRpcError::invalid_params(format!(
            "Unknown prompt: {}",
            params.name
        )));
    }

    let args: GreetArgs = match params.arguments {
        Some(v) => serde_json::from_value(v).map_err(|e| {
            JsonRpcError::invalid_params(format!("Invalid arguments for greet: {e}"))
        })?,
        None => {
            return Err(JsonRpcError::invalid_params("Missing arguments for greet"));
        }
    };

    Ok(serde_json::json!({
        "messages": [
            {
                "role": "user",
                "content": {
                    "type": "text",
                    "text": format!("Say hello to {}", args.name)
                }
            }
        ]
    }))
}
