use async_trait::async_trait;
use serde_json::{json, Value};

use super::{non_empty_string_argument, string_argument, ToolHandler};
use crate::errors::{AgentError, ToolResult};
use crate::models::tool::Tool;

pub const WRITE_SUCCESS: &str = "Write successful";

/// Creates or overwrites a file with the given content
pub struct WriteTool {
    tool: Tool,
}

impl Default for WriteTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteTool {
    pub fn new() -> Self {
        Self {
            tool: Tool::new(
                "Write",
                "Write content to a file",
                json!({
                    "type": "object",
                    "required": ["file_path", "content"],
                    "properties": {
                        "file_path": {
                            "type": "string",
                            "description": "The path of the file to write to"
                        },
                        "content": {
                            "type": "string",
                            "description": "The content to write to the file"
                        }
                    }
                }),
            ),
        }
    }
}

#[async_trait]
impl ToolHandler for WriteTool {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: &Value) -> ToolResult {
        // empty content is a valid write
        let (file_path, content) = non_empty_string_argument(arguments, "file_path")
            .and_then(|path| Ok((path, string_argument(arguments, "content")?)))
            .map_err(|_| invalid_arguments())?;

        tokio::fs::write(file_path, content)
            .await
            .map_err(|e| AgentError::WriteFailed(e.to_string()))?;
        Ok(WRITE_SUCCESS.to_string())
    }
}

fn invalid_arguments() -> AgentError {
    AgentError::MissingArguments(vec!["file_path".into(), "content".into()])
}
