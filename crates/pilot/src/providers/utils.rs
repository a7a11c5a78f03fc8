use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::message::{Message, MessageContent, ToolRequest, FUNCTION_CALL_TYPE};
use crate::models::role::Role;
use crate::models::tool::Tool;

/// Protocol violations by the endpoint. These end the session.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no choices in response")]
    NoChoices,

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    let mut messages_spec = Vec::new();

    for message in messages {
        match message.role {
            Role::Tool => {
                for content in &message.content {
                    if let MessageContent::ToolResponse(response) = content {
                        messages_spec.push(json!({
                            "role": "tool",
                            "tool_call_id": response.id,
                            "content": response.text(),
                        }));
                    }
                }
            }
            Role::User | Role::Assistant => {
                let text = message.text();
                let tool_calls: Vec<Value> = message
                    .tool_requests()
                    .into_iter()
                    .map(|request| {
                        json!({
                            "id": request.id,
                            "type": request.kind,
                            "function": {
                                "name": request.name,
                                "arguments": request.arguments,
                            }
                        })
                    })
                    .collect();

                let mut converted = json!({ "role": message.role });
                if tool_calls.is_empty() {
                    converted["content"] = json!(text);
                } else {
                    converted["content"] = if text.is_empty() {
                        Value::Null
                    } else {
                        json!(text)
                    };
                    converted["tool_calls"] = json!(tool_calls);
                }
                messages_spec.push(converted);
            }
        }
    }

    messages_spec
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// Convert OpenAI's API response to internal Message format
pub fn openai_response_to_message(response: &Value) -> Result<Message> {
    let choice = response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .ok_or(ProviderError::NoChoices)?;
    let original = choice
        .get("message")
        .ok_or_else(|| ProviderError::MalformedResponse("choice has no message".into()))?;

    let mut message = Message::assistant();

    if let Some(text) = original.get("content").and_then(|t| t.as_str()) {
        if !text.is_empty() {
            message = message.with_text(text);
        }
    }

    if let Some(tool_calls) = original.get("tool_calls").and_then(|t| t.as_array()) {
        for tool_call in tool_calls {
            let function = &tool_call["function"];
            // some endpoints send the arguments as an object rather than a string
            let arguments = match &function["arguments"] {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            message = message.with_content(MessageContent::tool_request(ToolRequest {
                id: tool_call["id"].as_str().unwrap_or_default().to_string(),
                kind: tool_call["type"]
                    .as_str()
                    .unwrap_or(FUNCTION_CALL_TYPE)
                    .to_string(),
                name: function["name"].as_str().unwrap_or_default().to_string(),
                arguments,
            }));
        }
    }

    Ok(message)
}

#[derive(Debug, Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}
