use std::collections::VecDeque;

use thiserror::Error;

use crate::models::message::Message;
use crate::models::role::Role;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversationError {
    #[error("Tool response for '{got}' does not answer the next pending call ({expected:?})")]
    UnexpectedToolResponse {
        expected: Option<String>,
        got: String,
    },

    #[error("Tool message carries no tool response")]
    MissingToolResponse,

    #[error("{0} tool call(s) are still unanswered")]
    PendingToolCalls(usize),
}

/// The transcript replayed to the model on every round.
///
/// Messages can only be appended. Tool messages must answer the requests of
/// the latest assistant message one by one, in the order they were issued.
#[derive(Debug, Clone)]
pub struct ConversationState {
    messages: Vec<Message>,
    pending: VecDeque<String>,
}

impl ConversationState {
    /// Start a conversation with the user's prompt
    pub fn new<S: Into<String>>(prompt: S) -> Self {
        Self {
            messages: vec![Message::user().with_text(prompt)],
            pending: VecDeque::new(),
        }
    }

    pub fn append(&mut self, message: Message) -> Result<(), ConversationError> {
        if message.role == Role::Tool {
            let response = message
                .tool_response()
                .ok_or(ConversationError::MissingToolResponse)?;
            if self.pending.front() != Some(&response.id) {
                return Err(ConversationError::UnexpectedToolResponse {
                    expected: self.pending.front().cloned(),
                    got: response.id.clone(),
                });
            }
            self.pending.pop_front();
        } else {
            if !self.pending.is_empty() {
                return Err(ConversationError::PendingToolCalls(self.pending.len()));
            }
            self.pending = message
                .tool_requests()
                .into_iter()
                .map(|r| r.id.clone())
                .collect();
        }

        self.messages.push(message);
        Ok(())
    }

    /// The full transcript, oldest first
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Ids of requests from the latest assistant message still waiting for a result
    pub fn pending_tool_calls(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    /// Seconds between the prompt and the latest message
    pub fn elapsed_secs(&self) -> i64 {
        match (self.messages.first(), self.messages.last()) {
            (Some(first), Some(last)) => (last.created - first.created).max(0),
            _ => 0,
        }
    }

    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}
