use async_trait::async_trait;
use serde_json::{json, Value};
use std::io::Write;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::Command;
use tracing::debug;

use super::{non_empty_string_argument, ToolHandler};
use crate::errors::{AgentError, ToolResult};
use crate::models::tool::Tool;

/// Runs a command as a literal argv vector.
///
/// The command string is split with shell quoting rules but never handed to a
/// shell, so pipes, redirection, globs and variables reach the program as
/// plain arguments.
pub struct BashTool {
    tool: Tool,
    audit: Mutex<Box<dyn Write + Send>>,
}

impl Default for BashTool {
    fn default() -> Self {
        Self::new()
    }
}

impl BashTool {
    pub fn new() -> Self {
        Self::with_audit(Box::new(std::io::stderr()))
    }

    /// Write the `Executing command:` audit lines to `audit` instead of stderr
    pub fn with_audit(audit: Box<dyn Write + Send>) -> Self {
        Self {
            audit: Mutex::new(audit),
            tool: Tool::new(
                "Bash",
                "Execute a shell command",
                json!({
                    "type": "object",
                    "required": ["command"],
                    "properties": {
                        "command": {
                            "type": "string",
                            "description": "The command to execute"
                        }
                    }
                }),
            ),
        }
    }

    fn audit(&self, command: &str) {
        // a poisoned or failing sink must not stop the command
        if let Ok(mut audit) = self.audit.lock() {
            let _ = writeln!(audit, "Executing command: {}", command);
            let _ = audit.flush();
        }
    }
}

#[async_trait]
impl ToolHandler for BashTool {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: &Value) -> ToolResult {
        let command = non_empty_string_argument(arguments, "command")?;

        // Audit trail for side effects, written before anything runs and
        // independent of the log filter
        self.audit(command);

        let argv = shell_words::split(command).map_err(|e| {
            AgentError::InvalidParameters(format!("could not parse command: {}", e))
        })?;
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| AgentError::InvalidParameters("command is empty".into()))?;

        debug!(program = %program, args = ?args, "spawning");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AgentError::ExecutionError(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        let code = output
            .status
            .code()
            .ok_or_else(|| AgentError::ExecutionError("terminated by signal".into()))?;
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let output = if !stderr.is_empty() {
            stderr
        } else if !stdout.is_empty() {
            stdout
        } else {
            "No output".to_string()
        };
        Err(AgentError::CommandFailed { code, output })
    }
}
