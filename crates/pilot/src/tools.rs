use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

use crate::errors::{AgentError, AgentResult, ToolResult};
use crate::models::tool::{Tool, ToolCall};

mod bash;
mod read;
mod write;

pub use bash::BashTool;
pub use read::ReadTool;
pub use write::WriteTool;

/// Default upper bound on a single tool call
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(120);

/// A single tool the model can call
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// The declaration advertised to the model
    fn tool(&self) -> &Tool;

    /// Run the tool. Arguments have already been checked against the
    /// `required` keys of the declaration.
    async fn call(&self, arguments: &Value) -> ToolResult;
}

/// The fixed set of tools offered to the model, in registration order
#[derive(Default)]
pub struct ToolRegistry {
    handlers: Vec<Box<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the Read, Write and Bash tools
    pub fn with_builtin_tools() -> Self {
        Self {
            handlers: vec![
                Box::new(ReadTool::new()),
                Box::new(WriteTool::new()),
                Box::new(BashTool::new()),
            ],
        }
    }

    pub fn register(&mut self, handler: Box<dyn ToolHandler>) -> AgentResult<()> {
        let name = &handler.tool().name;
        if self.get(name).is_some() {
            return Err(AgentError::DuplicateTool(name.clone()));
        }
        self.handlers.push(handler);
        Ok(())
    }

    /// Declarations for every registered tool, in registration order
    pub fn declarations(&self) -> Vec<Tool> {
        self.handlers.iter().map(|h| h.tool().clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn ToolHandler> {
        self.handlers
            .iter()
            .find(|h| h.tool().name == name)
            .map(|h| &**h)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Routes tool calls to their handler.
///
/// Every outcome, including unknown tools and bad arguments, comes back as a
/// `ToolResult` so the caller always has text to hand back to the model.
pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Option<Duration>,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            timeout: Some(DEFAULT_TOOL_TIMEOUT),
        }
    }

    /// Set the per-call time limit; `None` lets tools run indefinitely
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn declarations(&self) -> Vec<Tool> {
        self.registry.declarations()
    }

    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        info!("Tool call: {} with arguments {}", call.name, call.arguments);

        let handler = self
            .registry
            .get(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        if !call.arguments.is_object() {
            return Err(AgentError::InvalidParameters(
                "arguments must be a JSON object".into(),
            ));
        }

        // any absent key is reported with the full required set
        let required = handler.tool().required_arguments();
        if required
            .iter()
            .any(|key| call.arguments.get(*key).map_or(true, Value::is_null))
        {
            return Err(AgentError::MissingArguments(
                required.into_iter().map(String::from).collect(),
            ));
        }

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, handler.call(&call.arguments))
                .await
                .unwrap_or_else(|_| Err(AgentError::Timeout(limit))),
            None => handler.call(&call.arguments).await,
        }
    }
}

/// Fetch a string argument; absent or null counts as missing
fn string_argument<'a>(arguments: &'a Value, key: &str) -> AgentResult<&'a str> {
    match arguments.get(key) {
        None | Some(Value::Null) => Err(AgentError::MissingArguments(vec![key.to_string()])),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(AgentError::InvalidParameters(format!(
            "'{}' must be a string",
            key
        ))),
    }
}

/// Like `string_argument`, but an empty string also counts as missing
fn non_empty_string_argument<'a>(arguments: &'a Value, key: &str) -> AgentResult<&'a str> {
    let value = string_argument(arguments, key)?;
    if value.is_empty() {
        return Err(AgentError::MissingArguments(vec![key.to_string()]));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Clone)]
    struct SleepTool {
        tool: Tool,
    }

    impl SleepTool {
        fn new() -> Self {
            Self {
                tool: Tool::new(
                    "Sleep",
                    "Wait for a while",
                    json!({"type": "object", "required": [], "properties": {}}),
                ),
            }
        }
    }

    #[async_trait]
    impl ToolHandler for SleepTool {
        fn tool(&self) -> &Tool {
            &self.tool
        }

        async fn call(&self, _arguments: &Value) -> ToolResult {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("woke up".into())
        }
    }

    #[test]
    fn test_builtin_declarations() {
        let registry = ToolRegistry::with_builtin_tools();
        let names: Vec<String> = registry
            .declarations()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Read", "Write", "Bash"]);
    }

    #[test]
    fn test_register_duplicate() {
        let mut registry = ToolRegistry::with_builtin_tools();
        let err = registry.register(Box::new(ReadTool::new())).unwrap_err();
        assert_eq!(err, AgentError::DuplicateTool("Read".into()));
        assert_eq!(registry.len(), 3);

        registry.register(Box::new(SleepTool::new())).unwrap();
        assert_eq!(registry.len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let executor = ToolExecutor::new(ToolRegistry::with_builtin_tools());
        let result = executor
            .execute(&ToolCall::new("Delete", json!({"file_path": "x"})))
            .await;
        assert_eq!(result.unwrap_err().to_string(), "Unknown tool: Delete");
    }

    #[tokio::test]
    async fn test_missing_required_arguments() {
        let executor = ToolExecutor::new(ToolRegistry::with_builtin_tools());

        let result = executor.execute(&ToolCall::new("Write", json!({}))).await;
        assert_eq!(
            result.unwrap_err(),
            AgentError::MissingArguments(vec!["file_path".into(), "content".into()])
        );

        let result = executor
            .execute(&ToolCall::new("Write", json!({"file_path": "x", "content": null})))
            .await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Error: 'file_path' and 'content' arguments are required"
        );

        let result = executor.execute(&ToolCall::new("Read", json!({}))).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Error: 'file_path' argument is required"
        );
    }

    #[tokio::test]
    async fn test_non_object_arguments() {
        let executor = ToolExecutor::new(ToolRegistry::with_builtin_tools());
        let result = executor.execute(&ToolCall::new("Read", json!("x"))).await;
        assert!(matches!(result, Err(AgentError::InvalidParameters(_))));
    }

    #[tokio::test]
    async fn test_timeout() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(SleepTool::new())).unwrap();
        let executor =
            ToolExecutor::new(registry).with_timeout(Some(Duration::from_millis(50)));

        let result = executor.execute(&ToolCall::new("Sleep", json!({}))).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Error: tool timed out after 50ms"
        );
    }

    #[test]
    fn test_string_arguments() {
        let args = json!({"a": "x", "b": "", "c": 3, "d": null});
        assert_eq!(string_argument(&args, "a").unwrap(), "x");
        assert_eq!(string_argument(&args, "b").unwrap(), "");
        assert!(matches!(
            non_empty_string_argument(&args, "b"),
            Err(AgentError::MissingArguments(_))
        ));
        assert!(matches!(
            string_argument(&args, "c"),
            Err(AgentError::InvalidParameters(_))
        ));
        assert!(matches!(
            string_argument(&args, "d"),
            Err(AgentError::MissingArguments(_))
        ));
        assert!(matches!(
            string_argument(&args, "e"),
            Err(AgentError::MissingArguments(_))
        ));
    }
}
