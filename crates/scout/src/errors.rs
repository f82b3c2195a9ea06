use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while executing a tool call. These are values, not
/// just diagnostics: they travel back to the model inside the tool
/// response message so it can adjust its next request.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Path `{0}` is outside of the current working directory")]
    SandboxViolation(String),

    #[error("Not a text file (detected: {0})")]
    NotTextFile(String),

    #[error("Tool execution failed: {0}")]
    ExecutionError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
