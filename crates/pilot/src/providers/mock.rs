use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

use super::utils::ProviderError;
use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::providers::base::{Provider, Usage};

/// A mock provider that returns pre-configured responses and records every
/// transcript it was sent
pub struct MockProvider {
    responses: Mutex<Vec<Message>>,
    repeat: Option<Message>,
    transcripts: Mutex<Vec<Vec<Message>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses; once they run
    /// out it answers like an endpoint with no choices
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: Mutex::new(responses),
            repeat: None,
            transcripts: Mutex::new(Vec::new()),
        }
    }

    /// A provider that answers every call with the same message
    pub fn repeating(response: Message) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            repeat: Some(response),
            transcripts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.transcripts.lock().unwrap().len()
    }

    pub fn transcripts(&self) -> Vec<Vec<Message>> {
        self.transcripts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, messages: &[Message], _tools: &[Tool]) -> Result<(Message, Usage)> {
        self.transcripts.lock().unwrap().push(messages.to_vec());

        let mut responses = self.responses.lock().unwrap();
        if !responses.is_empty() {
            return Ok((responses.remove(0), Usage::new(Some(1), Some(1), Some(2))));
        }
        match &self.repeat {
            Some(message) => Ok((message.clone(), Usage::new(Some(1), Some(1), Some(2)))),
            None => Err(ProviderError::NoChoices.into()),
        }
    }
}
