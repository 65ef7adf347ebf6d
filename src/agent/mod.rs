//! The tool-calling conversation loop.
//!
//! [`ConversationLoop`] drives one user query to completion: it sends the
//! transcript to the [`CompletionGateway`], runs any requested tools through
//! the [`ToolInvoker`] one at a time, appends their results, and repeats
//! until the model answers without requesting tools.
//!
//! The loop is an explicit state machine ([`Step`]) with an optional bound on
//! gateway round-trips. Nothing is retried: the first error ends the query.

use std::collections::HashSet;

use crate::error::{ChatError, GatewayError, Result};
use crate::message::{Message, ToolCall};
use crate::provider::CompletionGateway;
use crate::tools::{ToolDescriptor, ToolInvoker, ToolSchema};

/// State for a single query. Append-only; dropped once the answer is returned.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    output: Vec<String>,
}

impl Conversation {
    pub fn new(system_prompt: Option<&str>, query: &str) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(prompt) = system_prompt {
            messages.push(Message::system(prompt));
        }
        messages.push(Message::user(query));
        Self {
            messages,
            output: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Output lines accumulated so far, in message order.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// The human-readable answer: output lines joined by newlines.
    pub fn transcript(&self) -> String {
        self.output.join("\n")
    }

    fn push_assistant(&mut self, reply: Message) {
        if reply.has_text() {
            self.output.push(reply.text().to_string());
        }
        self.messages.push(reply);
    }
}

enum Step {
    Dispatch,
    Resolve(Vec<ToolCall>),
    Finish,
}

pub struct ConversationLoop<'a> {
    gateway: &'a dyn CompletionGateway,
    invoker: ToolInvoker<'a>,
    schemas: Vec<ToolSchema>,
    system_prompt: Option<String>,
    max_turns: Option<usize>,
}

impl<'a> ConversationLoop<'a> {
    /// Tool schemas are derived once from the invoker's descriptors.
    pub fn new(gateway: &'a dyn CompletionGateway, invoker: ToolInvoker<'a>) -> Self {
        let schemas = invoker.schemas();
        Self {
            gateway,
            invoker,
            schemas,
            system_prompt: None,
            max_turns: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    /// `None` removes the bound on gateway round-trips.
    pub fn with_max_turns(mut self, max_turns: Option<usize>) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        self.invoker.tools()
    }

    /// Answers one query with a fresh [`Conversation`].
    pub async fn process_query(&self, query: &str) -> Result<String> {
        let mut conversation = Conversation::new(self.system_prompt.as_deref(), query);
        self.run(&mut conversation).await
    }

    /// Drives `conversation` until the model stops requesting tools.
    ///
    /// On error the conversation keeps whatever was appended before the
    /// failing step.
    pub async fn run(&self, conversation: &mut Conversation) -> Result<String> {
        let mut turns = 0usize;
        let mut step = Step::Dispatch;

        loop {
            step = match step {
                Step::Dispatch => {
                    if let Some(limit) = self.max_turns {
                        if turns >= limit {
                            return Err(ChatError::TurnLimitExceeded(limit));
                        }
                    }
                    turns += 1;
                    tracing::trace!(turn = turns, "dispatch");

                    let reply = self
                        .gateway
                        .complete(conversation.messages(), &self.schemas)
                        .await?;
                    let calls = reply.tool_calls.clone();
                    conversation.push_assistant(reply);

                    if calls.is_empty() {
                        Step::Finish
                    } else {
                        Step::Resolve(calls)
                    }
                }
                Step::Resolve(calls) => {
                    self.validate(&calls)?;
                    for call in calls {
                        tracing::trace!(tool = %call.name, id = %call.id, "resolve");
                        let result = self.invoker.invoke(&call.name, call.arguments.clone()).await?;
                        conversation.output.push(call_marker(&call));
                        conversation
                            .messages
                            .push(Message::tool_result(call.id, result));
                    }
                    Step::Dispatch
                }
                Step::Finish => {
                    tracing::trace!(turns, "finish");
                    return Ok(conversation.transcript());
                }
            }
        }
    }

    /// Rejects the whole turn before any tool runs, so a bad request never
    /// leaves partial results behind.
    fn validate(&self, calls: &[ToolCall]) -> Result<()> {
        let mut seen = HashSet::new();
        for call in calls {
            self.invoker.ensure_known(&call.name)?;
            if !seen.insert(call.id.as_str()) {
                return Err(GatewayError::Decode(format!(
                    "duplicate tool call id `{}`",
                    call.id
                ))
                .into());
            }
        }
        Ok(())
    }
}

/// `[Calling tool NAME with args ARGS]`, with ARGS as compact JSON.
pub fn call_marker(call: &ToolCall) -> String {
    format!("[Calling tool {} with args {}]", call.name, call.arguments)
}

#[cfg(test)]
mod tests;
