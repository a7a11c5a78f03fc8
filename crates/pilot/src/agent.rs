use anyhow::{anyhow, Result};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::conversation::ConversationState;
use crate::errors::{AgentError, ToolResult};
use crate::models::message::{Message, ToolRequest};
use crate::providers::base::{Provider, Usage};
use crate::tools::ToolExecutor;

/// Model calls allowed per invocation unless configured otherwise
pub const DEFAULT_MAX_TURNS: usize = 5;

/// How an invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The model answered without requesting tools
    Completed { answer: String },
    /// The turn budget ran out; carries the last assistant text, possibly empty
    Aborted { partial: String },
    /// The cancel signal fired; carries the last assistant text, possibly empty
    Cancelled { partial: String },
}

impl LoopOutcome {
    pub fn text(&self) -> &str {
        match self {
            LoopOutcome::Completed { answer } => answer,
            LoopOutcome::Aborted { partial } | LoopOutcome::Cancelled { partial } => partial,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, LoopOutcome::Completed { .. })
    }
}

/// Agent pairs a model endpoint with the tools it may drive
pub struct Agent {
    provider: Box<dyn Provider>,
    executor: ToolExecutor,
    max_turns: usize,
}

impl Agent {
    pub fn new(provider: Box<dyn Provider>, executor: ToolExecutor) -> Self {
        Self {
            provider,
            executor,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Cap the number of model calls per invocation (at least one)
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    /// Begin a new invocation with its own transcript and turn budget
    pub fn start<S: Into<String>>(&self, prompt: S) -> AgentLoop<'_> {
        AgentLoop {
            agent: self,
            conversation: ConversationState::new(prompt),
            turns_remaining: self.max_turns,
            model_calls: 0,
            usage: Usage::default(),
            finished: false,
        }
    }

    /// Run a prompt to completion and return only the outcome
    pub async fn reply<S: Into<String>>(
        &self,
        prompt: S,
        cancel: watch::Receiver<bool>,
    ) -> Result<LoopOutcome> {
        self.start(prompt).run(cancel).await
    }
}

/// One invocation of the agent: model call, tool dispatch, repeat.
pub struct AgentLoop<'a> {
    agent: &'a Agent,
    conversation: ConversationState,
    turns_remaining: usize,
    model_calls: usize,
    usage: Usage,
    finished: bool,
}

impl<'a> AgentLoop<'a> {
    /// Drive the loop until the model stops calling tools, the turn budget is
    /// spent, or `cancel` becomes true.
    ///
    /// Tool failures never end the loop; they are answered as text. Only
    /// provider errors (including a response with no choices) are returned as `Err`.
    pub async fn run(&mut self, mut cancel: watch::Receiver<bool>) -> Result<LoopOutcome> {
        if self.finished {
            return Err(anyhow!("agent loop has already finished"));
        }
        self.finished = true;

        let tools = self.agent.executor.declarations();

        let outcome = loop {
            if *cancel.borrow() {
                warn!("Cancelled before calling the model");
                break LoopOutcome::Cancelled {
                    partial: self.last_text(),
                };
            }

            let (response, usage) = self
                .agent
                .provider
                .complete(self.conversation.snapshot(), &tools)
                .await?;
            self.model_calls += 1;
            self.usage.accumulate(&usage);

            let requests: Vec<ToolRequest> =
                response.tool_requests().into_iter().cloned().collect();
            self.conversation.append(response)?;

            if requests.is_empty() {
                break LoopOutcome::Completed {
                    answer: self.last_text(),
                };
            }

            let mut cancelled = false;
            for request in &requests {
                cancelled = cancelled || *cancel.borrow();
                let result = if cancelled {
                    Err(AgentError::Cancelled)
                } else {
                    self.dispatch(request, &mut cancel).await
                };
                cancelled = cancelled || matches!(result, Err(AgentError::Cancelled));
                self.conversation
                    .append(Message::tool_result(&request.id, result))?;
            }

            if cancelled {
                warn!("Cancelled while running tools");
                break LoopOutcome::Cancelled {
                    partial: self.last_text(),
                };
            }

            self.turns_remaining -= 1;
            if self.turns_remaining == 0 {
                warn!("Reached maximum loop count, stopping to prevent infinite loop.");
                break LoopOutcome::Aborted {
                    partial: self.last_text(),
                };
            }
        };

        debug!(
            model_calls = self.model_calls,
            messages = self.conversation.len(),
            elapsed_secs = self.conversation.elapsed_secs(),
            total_tokens = ?self.usage.total_tokens,
            "agent loop finished"
        );
        Ok(outcome)
    }

    async fn dispatch(
        &self,
        request: &ToolRequest,
        cancel: &mut watch::Receiver<bool>,
    ) -> ToolResult {
        let call = request.tool_call().map_err(|e| {
            warn!(id = %request.id, "Rejected tool call: {}", e);
            e
        })?;

        tokio::select! {
            result = self.agent.executor.execute(&call) => result,
            _ = cancelled(cancel) => Err(AgentError::Cancelled),
        }
    }

    fn last_text(&self) -> String {
        self.conversation
            .last_assistant()
            .map(Message::text)
            .unwrap_or_default()
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    pub fn model_calls(&self) -> usize {
        self.model_calls
    }

    pub fn usage(&self) -> &Usage {
        &self.usage
    }

    pub fn into_conversation(self) -> ConversationState {
        self.conversation
    }
}

/// Resolves once the flag is set. A dropped sender can no longer cancel.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
