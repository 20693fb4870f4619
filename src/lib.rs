//! "Say Hello" MCP server.
//!
//! Exposes a `hello` greeting tool, a `health_check` tool that probes the
//! Gemini CLI through a chain of fallback execution strategies, a static
//! `history://hello-world` resource, and a `greet` prompt — all over
//! JSON-RPC 2.0 stdio transport, compatible with any MCP-aware AI agent.

pub mod config;
pub mod handlers;
pub mod prober;
pub mod protocol;
pub mod server;

pub mod schema;
