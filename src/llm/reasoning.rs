//! One reasoning step of the agent model.
//!
//! `Reasoning::respond_with_tools` hands the turn transcript and the tool
//! catalog to the model and reports whether it answered or picked tools.

use std::sync::Arc;

use crate::error::LlmError;
use crate::llm::{
    ChatMessage, CompletionRequest, LlmProvider, ToolCall, ToolCompletionRequest, ToolDefinition,
};

/// Token usage from an LLM call.
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// What the agent model decided for this step.
#[derive(Debug)]
pub enum RespondResult {
    /// A reply for the user.
    Text(String),
    /// Tools to run before the next step. `content` is any text sent alongside.
    ToolCalls {
        tool_calls: Vec<ToolCall>,
        content: Option<String>,
    },
}

#[derive(Debug)]
pub struct RespondOutput {
    pub result: RespondResult,
    pub usage: TokenUsage,
}

pub struct Reasoning {
    llm: Arc<dyn LlmProvider>,
    temperature: Option<f32>,
}

impl Reasoning {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Run one model call. An empty catalog falls back to a plain completion.
    pub async fn respond_with_tools(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDefinition>,
    ) -> Result<RespondOutput, LlmError> {
        if tools.is_empty() {
            let mut request = CompletionRequest::new(messages);
            request.temperature = self.temperature;
            let response = self.llm.complete(request).await?;
            return Ok(RespondOutput {
                result: RespondResult::Text(response.content),
                usage: TokenUsage {
                    input_tokens: response.input_tokens,
                    output_tokens: response.output_tokens,
                },
            });
        }

        let mut request = ToolCompletionRequest::new(messages, tools);
        request.temperature = self.temperature;
        let response = self.llm.complete_with_tools(request).await?;

        let usage = TokenUsage {
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
        };
        let result = if response.tool_calls.is_empty() {
            RespondResult::Text(response.content.unwrap_or_default())
        } else {
            RespondResult::ToolCalls {
                tool_calls: response.tool_calls,
                content: response.content,
            }
        };
        Ok(RespondOutput { result, usage })
    }
}
