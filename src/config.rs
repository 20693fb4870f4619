use std::time::Duration;

/// Default program probed by the health check.
pub const DEFAULT_GEMINI_PROGRAM: &str = "gemini";

/// Default model passed to the Gemini CLI.
const DEFAULT_HEALTH_MODEL: &str = "gemini-2.5-flash";

/// Default prompt sent during a health check.
const DEFAULT_HEALTH_PROMPT: &str = "say hi";

/// Default per-strategy timeout for the health check probe (10 seconds).
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub gemini_program: String,
    pub health_model: String,
    pub health_prompt: String,
    pub probe_timeout: Duration,
}

impl ServerConfig {
    /// Load configuration from environment.
    ///
    /// - `GEMINI_CLI_BIN` (optional, default `gemini`) — program probed by `health_check`
    /// - `GEMINI_HEALTH_MODEL` (optional, default `gemini-2.5-flash`) — model flag value
    /// - `GEMINI_HEALTH_PROMPT` (optional, default `say hi`) — prompt flag value
    /// - `GEMINI_HEALTH_TIMEOUT_SECS` (optional, default 10) — max seconds per strategy
    pub fn from_env() -> Result<Self, String> {
        let gemini_program = std::env::var("GEMINI_CLI_BIN")
            .unwrap_or_else(|_| DEFAULT_GEMINI_PROGRAM.to_string());

        let health_model = std::env::var("GEMINI_HEALTH_MODEL")
            .unwrap_or_else(|_| DEFAULT_HEALTH_MODEL.to_string());

        let health_prompt = std::env::var("GEMINI_HEALTH_PROMPT")
            .unwrap_or_else(|_| DEFAULT_HEALTH_PROMPT.to_string());

        let probe_timeout_secs = match std::env::var("GEMINI_HEALTH_TIMEOUT_SECS") {
            Ok(val) => match val.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(
                        "GEMINI_HEALTH_TIMEOUT_SECS must be a positive integer".to_string()
                    );
                }
            },
            Err(_) => DEFAULT_PROBE_TIMEOUT_SECS,
        };

        Ok(Self {
            gemini_program,
            health_model,
            health_prompt,
            probe_timeout: Duration::from_secs(probe_timeout_secs),
        })
    }

    /// Fixed argument list the health check passes to the target program.
    pub fn health_args(&self) -> Vec<String> {
        vec![
            "-m".to_string(),
            self.health_model.clone(),
            "-p".to_string(),
            self.health_prompt.clone(),
        ]
    }
}
