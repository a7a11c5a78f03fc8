use async_trait::async_trait;
use serde_json::{json, Value};

use super::{non_empty_string_argument, ToolHandler};
use crate::errors::{AgentError, ToolResult};
use crate::models::tool::Tool;

/// Returns the full contents of a file
pub struct ReadTool {
    tool: Tool,
}

impl Default for ReadTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadTool {
    pub fn new() -> Self {
        Self {
            tool: Tool::new(
                "Read",
                "Read and return the contents of a file",
                json!({
                    "type": "object",
                    "required": ["file_path"],
                    "properties": {
                        "file_path": {
                            "type": "string",
                            "description": "The path to the file to read"
                        }
                    }
                }),
            ),
        }
    }
}

#[async_trait]
impl ToolHandler for ReadTool {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: &Value) -> ToolResult {
        let file_path = non_empty_string_argument(arguments, "file_path")?;
        tokio::fs::read_to_string(file_path)
            .await
            .map_err(|e| AgentError::ReadFailed(e.to_string()))
    }
}
