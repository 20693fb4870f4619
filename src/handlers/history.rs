use crate::protocol::{JsonRpcError, ReadResourceParams};

/// URI of the hello-world history resource.
pub const HISTORY_URI: &str = "history://hello-world";

/// Static text served for the hello-world history resource.
pub const HISTORY_TEXT: &str = "\"Hello, World\" first appeared in a 1972 Bell Labs memo \
by Brian Kernighan and later became the iconic first program for beginners in countless languages.";

/// Handle a `resources/read` request.
pub async fn handle(params: ReadResourceParams) -> Result<serde_json::Value, JsonRpcError> {
    if params.uri != HISTORY_URI {
        return Err(JsonRpcError::invalid_params(format!(
            "Unknown resource: {}",
            params.uri
        )));
    }

    Ok(serde_json::json!({
        "contents": [
            {
                "uri": HISTORY_URI,
                "mimeType": "text/plain",
                "text": HISTORY_TEXT
            }
        ]
    }))
}
