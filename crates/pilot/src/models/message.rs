use super::role::Role;
use super::tool::ToolCall;
use crate::errors::{tool_result_text, AgentError, AgentResult, ToolResult};
use chrono::Utc;
use serde_json::Value;

/// The only call type the endpoint is expected to issue.
pub const FUNCTION_CALL_TYPE: &str = "function";

/// A tool call request issued by the model, kept exactly as received so it
/// can be replayed verbatim on the next round.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolRequest {
    pub id: String,
    pub kind: String,
    pub name: String,
    /// JSON-encoded argument object
    pub arguments: String,
}

impl ToolRequest {
    pub fn function<S: Into<String>, N: Into<String>>(id: S, name: N, arguments: Value) -> Self {
        Self {
            id: id.into(),
            kind: FUNCTION_CALL_TYPE.to_string(),
            name: name.into(),
            arguments: arguments.to_string(),
        }
    }

    /// Decode the request into an executable call.
    ///
    /// Unsupported call types and undecodable arguments come back as errors so
    /// they can be answered like any other tool failure.
    pub fn tool_call(&self) -> AgentResult<ToolCall> {
        if self.kind != FUNCTION_CALL_TYPE {
            return Err(AgentError::UnsupportedCallType(self.kind.clone()));
        }

        let arguments = if self.arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str::<Value>(&self.arguments).map_err(|e| {
                AgentError::InvalidParameters(format!(
                    "Could not interpret tool use parameters for id {}: {}",
                    self.id, e
                ))
            })?
        };

        if !arguments.is_object() {
            return Err(AgentError::InvalidParameters(format!(
                "Tool use parameters for id {} must be a JSON object",
                self.id
            )));
        }

        Ok(ToolCall::new(&self.name, arguments))
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolResponse {
    pub id: String,
    pub tool_result: ToolResult,
}

impl ToolResponse {
    pub fn text(&self) -> String {
        tool_result_text(&self.tool_result)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// Content passed inside a message, which can be both simple content and tool content
pub enum MessageContent {
    Text(String),
    ToolRequest(ToolRequest),
    ToolResponse(ToolResponse),
}

impl MessageContent {
    pub fn text<S: Into<String>>(text: S) -> Self {
        MessageContent::Text(text.into())
    }

    pub fn tool_request(request: ToolRequest) -> Self {
        MessageContent::ToolRequest(request)
    }

    pub fn tool_response<S: Into<String>>(id: S, tool_result: ToolResult) -> Self {
        MessageContent::ToolResponse(ToolResponse {
            id: id.into(),
            tool_result,
        })
    }

    pub fn as_tool_request(&self) -> Option<&ToolRequest> {
        if let MessageContent::ToolRequest(ref tool_request) = self {
            Some(tool_request)
        } else {
            None
        }
    }

    pub fn as_tool_response(&self) -> Option<&ToolResponse> {
        if let MessageContent::ToolResponse(ref tool_response) = self {
            Some(tool_response)
        } else {
            None
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// A message to or from an LLM
pub struct Message {
    pub role: Role,
    pub created: i64,
    pub content: Vec<MessageContent>,
}

impl Message {
    fn with_role(role: Role) -> Self {
        Message {
            role,
            created: Utc::now().timestamp(),
            content: Vec::new(),
        }
    }

    /// Create a new user message with the current timestamp
    pub fn user() -> Self {
        Self::with_role(Role::User)
    }

    /// Create a new assistant message with the current timestamp
    pub fn assistant() -> Self {
        Self::with_role(Role::Assistant)
    }

    /// Create a tool message answering the request with the given id
    pub fn tool_result<S: Into<String>>(id: S, result: ToolResult) -> Self {
        Self::with_role(Role::Tool).with_content(MessageContent::tool_response(id, result))
    }

    /// Add any MessageContent to the message
    pub fn with_content(mut self, content: MessageContent) -> Self {
        self.content.push(content);
        self
    }

    /// Add text content to the message
    pub fn with_text<S: Into<String>>(self, text: S) -> Self {
        self.with_content(MessageContent::text(text))
    }

    /// Add a function tool request to the message
    pub fn with_tool_request<S: Into<String>, N: Into<String>>(
        self,
        id: S,
        name: N,
        arguments: Value,
    ) -> Self {
        self.with_content(MessageContent::tool_request(ToolRequest::function(
            id, name, arguments,
        )))
    }

    /// All text content joined with newlines; empty when the message has none
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| c.as_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Tool requests in the order the model issued them
    pub fn tool_requests(&self) -> Vec<&ToolRequest> {
        self.content
            .iter()
            .filter_map(|c| c.as_tool_request())
            .collect()
    }

    pub fn has_tool_requests(&self) -> bool {
        self.content.iter().any(|c| c.as_tool_request().is_some())
    }

    pub fn tool_response(&self) -> Option<&ToolResponse> {
        self.content.iter().find_map(|c| c.as_tool_response())
    }
}
