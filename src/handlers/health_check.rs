use crate::config::ServerConfig;
use crate::prober::{ProbeResult, Prober};
use crate::protocol::ToolResult;

/// JSON Schema for the `health_check` tool's arguments (none).
pub fn input_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {}
    })
}

/// Handle a `health_check` tool call.
///
/// Runs the Gemini CLI probe and renders its result as a plain text payload.
/// Every fault path inside the probe is already recovered into a
/// `ProbeResult`, so this handler always produces a response.
pub async fn handle(config: &ServerConfig) -> ToolResult {
    let prober = Prober::from_config(config);
    render(prober.probe().await)
}

/// Render a probe result into the tool's response text.
///
/// Non-empty stderr on success is surfaced as a "Warnings:" section, verbatim.
/// Failure is still an ordinary text result — the protocol never sees a fault.
pub fn render(result: ProbeResult) -> ToolResult {
    match result {
        ProbeResult::Success { stdout, stderr } => {
            let mut text = format!("Health check successful!\n\nGemini response:\n{stdout}");
            if !stderr.is_empty() {
                text.push_str(&format!("\n\nWarnings:\n{stderr}"));
            }
            ToolResult::text(text)
        }
        ProbeResult::Failure { error } => {
            ToolResult::text(format!("Health check failed!\n\nError: {error}"))
        }
    }
}
