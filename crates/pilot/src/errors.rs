use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Failures produced while dispatching a tool call.
///
/// None of these are fatal to the agent loop: the `Display` text of the error
/// is what gets sent back to the model as the tool message content.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Error: {} required", describe_missing(.0))]
    MissingArguments(Vec<String>),

    #[error("Error: invalid arguments: {0}")]
    InvalidParameters(String),

    #[error("Error: Unknown tool call type {0}")]
    UnsupportedCallType(String),

    #[error("Error reading file: {0}")]
    ReadFailed(String),

    #[error("Error writing file: {0}")]
    WriteFailed(String),

    #[error("Command failed with exit code {code}: {output}")]
    CommandFailed { code: i32, output: String },

    #[error("Error executing command: {0}")]
    ExecutionError(String),

    #[error("Error: tool timed out after {0:?}")]
    Timeout(Duration),

    #[error("Error: tool call cancelled")]
    Cancelled,
}

pub type AgentResult<T> = Result<T, AgentError>;

/// Outcome of a single tool call: success text or a failure that renders as text.
pub type ToolResult = AgentResult<String>;

fn describe_missing(keys: &[String]) -> String {
    let quoted: Vec<String> = keys.iter().map(|key| format!("'{}'", key)).collect();
    match quoted.as_slice() {
        [] => "arguments are".to_string(),
        [one] => format!("{} argument is", one),
        [init @ .., last] => format!("{} and {} arguments are", init.join(", "), last),
    }
}

/// Render a tool result as the plain text carried by a tool message.
pub fn tool_result_text(result: &ToolResult) -> String {
    match result {
        Ok(text) => text.clone(),
        Err(e) => e.to_string(),
    }
}
