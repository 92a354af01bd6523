//! The agent orchestration loop.
//!
//! One invocation drives a strictly sequential cycle: call the model,
//! classify the response, dispatch any requested tools, feed the results
//! back, and stop on a terminal response or the iteration cap.

use std::sync::Arc;

use crate::error::{ColloquyError, Result};
use crate::llm::ModelClient;
use crate::message::{ContentBlock, StopReason, Turn, Usage};
use crate::session::SessionStore;
use crate::tool::ToolRegistry;

pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// Result of one completed loop invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutcome {
    pub reply: String,
    pub usage: Usage,
    pub iterations: u32,
}

/// An agent that alternates between the model and registered tools until the
/// model stops asking for them.
pub struct Agent<M: ModelClient> {
    system_prompt: String,
    model: Arc<M>,
    tools: ToolRegistry,
    max_iterations: u32,
}

impl<M: ModelClient> Agent<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self {
            system_prompt: "You are a helpful assistant.".to_string(),
            model,
            tools: ToolRegistry::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn tools_mut(&mut self) -> &mut ToolRegistry {
        &mut self.tools
    }

    /// Run one exchange for `session_id`: append the user message, then loop
    /// until the model produces a terminal response.
    ///
    /// Every turn is appended to the store as it is produced, so on failure
    /// (iteration cap, upstream error) the transcript keeps whatever was
    /// appended so far.
    pub async fn run(
        &self,
        sessions: &dyn SessionStore,
        session_id: &str,
        message: impl Into<String>,
    ) -> Result<AgentOutcome> {
        sessions.append(session_id, Turn::user(message.into())).await;
        let mut transcript = sessions.get_or_create(session_id).await;

        let specs = self.tools.describe();
        let mut usage = Usage::default();

        for iteration in 1..=self.max_iterations {
            let response = self
                .model
                .complete(&self.system_prompt, &specs, transcript.turns())
                .await?;
            usage.accumulate(&response.usage);

            if response.stop_reason != StopReason::ToolUse || !response.has_tool_use() {
                let reply = response.first_text().unwrap_or_default().to_string();
                let turn = Turn::assistant_blocks(response.content);
                sessions.append(session_id, turn).await;
                tracing::debug!(session_id, iterations = iteration, "agent loop done");
                return Ok(AgentOutcome {
                    reply,
                    usage,
                    iterations: iteration,
                });
            }

            let assistant = Turn::assistant_blocks(response.content.clone());
            sessions.append(session_id, assistant.clone()).await;
            transcript.push(assistant);

            // One result per tool-use block, in issue order, errors included.
            let mut results = Vec::new();
            for block in &response.content {
                if let ContentBlock::ToolUse { id, name, input } = block {
                    tracing::debug!(session_id, tool = %name, "dispatching tool call");
                    let output = self.tools.execute(name, input.clone()).await;
                    results.push(ContentBlock::ToolResult {
                        tool_use_id: id.clone(),
                        content: serde_json::to_string(&output)?,
                    });
                }
            }
            let result_turn = Turn::user_blocks(results);
            sessions.append(session_id, result_turn.clone()).await;
            transcript.push(result_turn);
        }

        tracing::warn!(
            session_id,
            max_iterations = self.max_iterations,
            "agent loop hit the iteration cap"
        );
        Err(ColloquyError::IterationLimit(self.max_iterations))
    }
}
