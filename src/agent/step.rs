//! Agent steps and the fold that reduces a turn to its outcome.
//!
//! A turn is reported as an ordered stream of steps. `parse_response` keeps
//! the last tool name and the last non-empty agent message; earlier values
//! are overwritten.

use futures::{Stream, StreamExt};
use serde::Serialize;

/// Tool name reported when no tool ran.
pub const NO_TOOL: &str = "None";

/// One message carried by a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepMessage {
    /// Tool that produced the message, for tool results.
    pub name: Option<String>,
    pub content: Option<String>,
}

impl StepMessage {
    /// Agent message with text content.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            name: None,
            content: Some(content.into()),
        }
    }

    /// Tool result message.
    pub fn tool_result(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            content: Some(content.into()),
        }
    }
}

/// One event from an agent turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AgentStep {
    /// A tool ran.
    Tool {
        name: String,
        messages: Vec<StepMessage>,
    },
    /// The model produced a turn.
    Agent { messages: Vec<StepMessage> },
}

impl AgentStep {
    /// Tool step without result messages.
    pub fn tool(name: impl Into<String>) -> Self {
        Self::Tool {
            name: name.into(),
            messages: Vec::new(),
        }
    }

    /// Agent step with a single text message.
    pub fn agent_text(content: impl Into<String>) -> Self {
        Self::Agent {
            messages: vec![StepMessage::text(content)],
        }
    }
}

/// Outcome of one turn: which tool ran last and the final answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    pub tool_name: String,
    pub response: Option<String>,
}

impl Default for DispatchResult {
    fn default() -> Self {
        Self {
            tool_name: NO_TOOL.to_string(),
            response: None,
        }
    }
}

impl DispatchResult {
    /// Fold one step into the result.
    pub fn absorb(mut self, step: &AgentStep) -> Self {
        match step {
            AgentStep::Tool { name, .. } => {
                self.tool_name = name.clone();
            }
            AgentStep::Agent { messages } => {
                for content in messages.iter().filter_map(|m| m.content.as_deref()) {
                    if !content.is_empty() {
                        self.response = Some(content.to_string());
                    }
                }
            }
        }
        self
    }

    /// The tool that ran last, if any.
    pub fn tool_called(&self) -> Option<&str> {
        (self.tool_name != NO_TOOL).then_some(self.tool_name.as_str())
    }
}

/// Reduce a sequence of steps to a `DispatchResult`.
pub fn parse_response<I>(steps: I) -> DispatchResult
where
    I: IntoIterator<Item = AgentStep>,
{
    steps
        .into_iter()
        .fold(DispatchResult::default(), |acc, step| acc.absorb(&step))
}

/// Reduce a stream of steps to a `DispatchResult`, consuming it in order.
pub async fn parse_response_stream<S>(steps: S) -> DispatchResult
where
    S: Stream<Item = AgentStep>,
{
    steps
        .fold(DispatchResult::default(), |acc, step| async move {
            acc.absorb(&step)
        })
        .await
}
