use anyhow::Result;
use futures::stream::BoxStream;
use std::sync::Arc;

use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::models::message::{Message, ToolRequest};
use crate::models::tool::{Tool, ToolCall};
use crate::prompts::AGENT_PROMPT;
use crate::providers::base::Provider;
use crate::systems::System;

/// Agent integrates a foundational LLM with the systems it needs to pilot
pub struct Agent {
    systems: Vec<Box<dyn System>>,
    provider: Arc<dyn Provider>,
}

impl Agent {
    /// Create a new Agent with the specified provider
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            systems: Vec::new(),
            provider,
        }
    }

    /// Add a system to the agent
    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    /// All tools advertised by all systems
    fn get_tools(&self) -> Vec<Tool> {
        self.systems
            .iter()
            .flat_map(|system| system.tools().iter().cloned())
            .collect()
    }

    /// Find the system that advertises the named tool
    fn get_system_for_tool(&self, name: &str) -> Option<&dyn System> {
        self.systems
            .iter()
            .find(|system| system.tools().iter().any(|tool| tool.name == name))
            .map(|system| &**system)
    }

    /// Dispatch a single tool call to the appropriate system
    async fn dispatch_tool_call(
        &self,
        tool_call: AgentResult<ToolCall>,
    ) -> AgentResult<Vec<Content>> {
        let call = tool_call?;
        let system = self
            .get_system_for_tool(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        system.call(call).await
    }

    /// Persona prompt followed by the instructions of each system
    fn get_system_prompt(&self) -> String {
        let mut prompt = AGENT_PROMPT.to_string();
        for system in &self.systems {
            prompt.push_str("\n\n");
            prompt.push_str(system.instructions());
        }
        prompt
    }

    /// Create a stream that yields each message as the agent works the
    /// mission: the assistant's planning responses and one tool-response
    /// message per round of tool calls. The stream ends once a planning
    /// response carries non-empty visible content.
    pub async fn reply(&self, messages: &[Message]) -> Result<BoxStream<'_, Result<Message>>> {
        let mut messages = messages.to_vec();
        let tools = self.get_tools();
        let system_prompt = self.get_system_prompt();

        Ok(Box::pin(async_stream::try_stream! {
            loop {
                let completion = self.provider.complete(
                    &system_prompt,
                    &messages,
                    &tools,
                ).await?;
                let response = completion.message;
                tracing::debug!(thoughts = %completion.thoughts, "planning round finished");

                yield response.clone();
                messages.push(response.clone());

                let tool_requests: Vec<ToolRequest> = response
                    .tool_requests()
                    .into_iter()
                    .cloned()
                    .collect();

                if !tool_requests.is_empty() {
                    // Tool calls run one at a time, in the order the model
                    // issued them, so every result lands in the transcript
                    // in request order. A failed call still gets a response.
                    let mut message_tool_response = Message::user();
                    for request in &tool_requests {
                        let output = self.dispatch_tool_call(request.tool_call.clone()).await;
                        message_tool_response = message_tool_response
                            .with_tool_response(request.id.clone(), output);
                    }

                    yield message_tool_response.clone();
                    messages.push(message_tool_response);
                }

                // Non-empty content is the final answer for this mission;
                // an empty response with no tool calls means plan again
                if !response.text().trim().is_empty() {
                    break;
                }
            }
        }))
    }
}
