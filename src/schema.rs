use jsonschema::validator_for;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SchemaValidationError {
    #[error("Schema compile error: {0}")]
    SchemaCompile(String),
    #[error("Arguments do not match the tool's input schema")]
    ValidationFailed,
}

/// Validate a tool's call arguments against its advertised input schema
/// (draft 2020-12). Returns Ok(()) if valid, Err otherwise.
pub fn validate_tool_args(schema: &Value, args: &Value) -> Result<(), SchemaValidationError> {
    let validator = validator_for(schema)
        .map_err(|e| SchemaValidationError::SchemaCompile(e.to_string()))?;

    if validator.is_valid(args) {
        Ok(())
    } else {
        Err(SchemaValidationError::ValidationFailed)
    }
}
