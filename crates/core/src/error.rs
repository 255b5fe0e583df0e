//! Error types for the Patchloom domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! The split matters for the agent loop: `ProviderError` and `AgentError`
//! are fatal to the invocation that hit them, while `ToolError` is always
//! converted into a structured string fed back to the model and never
//! crosses the dispatch boundary as an `Err`.

use thiserror::Error;

/// The top-level error type for all Patchloom operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Stream ended without a completed turn")]
    MissingCompletion,

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent not found: {0}")]
    NotFound(String),

    #[error("No input available for top-level agent")]
    NoInput,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Command exited with status {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}
