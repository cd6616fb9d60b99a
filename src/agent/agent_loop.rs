//! Main agent loop.
//!
//! One user message runs through an explicit state machine:
//!
//! ```text
//! Reason ──text──────────────▶ Done
//!   │  ▲
//!   │  └── all calls executed
//!   └──tool calls──▶ Act (one call per step)
//! ```
//!
//! Every model turn yields one `AgentStep::Agent`, every executed tool one
//! `AgentStep::Tool`. The loop stops when the model answers without tool
//! calls or after `max_iterations` model turns.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use futures::stream::{self, BoxStream};

use crate::agent::step::{AgentStep, DispatchResult, StepMessage, parse_response_stream};
use crate::config::AgentConfig;
use crate::context::TurnContext;
use crate::error::ToolError;
use crate::llm::{ChatMessage, LlmProvider, Reasoning, RespondResult, ToolCall};
use crate::tools::registry::ToolRegistry;

/// Answer used when the agent model itself fails.
pub const AGENT_FAILURE_REPLY: &str = "I'm sorry, I'm having trouble responding right now. \
If you're in crisis, please contact your local emergency number or a crisis hotline right away.";

/// Core dependencies for the agent.
pub struct AgentDeps {
    pub llm: Arc<dyn LlmProvider>,
    pub tools: Arc<ToolRegistry>,
}

/// The dispatcher: routes each user message to the right tool and answer.
pub struct Agent {
    config: AgentConfig,
    deps: AgentDeps,
}

impl Agent {
    /// Create a new agent.
    pub fn new(config: AgentConfig, deps: AgentDeps) -> Self {
        Self { config, deps }
    }

    /// Stream the steps of one turn.
    pub fn stream(
        &self,
        system_prompt: &str,
        user_message: &str,
        ctx: TurnContext,
    ) -> BoxStream<'static, AgentStep> {
        tracing::debug!(
            turn = %ctx.turn_id,
            user = %ctx.user_id,
            "Starting turn ({} chars)",
            user_message.len()
        );

        let state = TurnLoop {
            reasoning: Reasoning::new(Arc::clone(&self.deps.llm))
                .with_temperature(self.config.temperature),
            tools: Arc::clone(&self.deps.tools),
            ctx,
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_message),
            ],
            iteration: 0,
            max_iterations: self.config.max_iterations,
            phase: Phase::Reason,
        };

        stream::unfold(state, |mut state| async move {
            state.next_step().await.map(|step| (step, state))
        })
        .boxed()
    }

    /// Run one turn with an explicit system prompt and fold it.
    pub async fn dispatch(
        &self,
        system_prompt: &str,
        user_message: &str,
        ctx: TurnContext,
    ) -> DispatchResult {
        parse_response_stream(self.stream(system_prompt, user_message, ctx)).await
    }

    /// Run one turn with the configured system prompt.
    pub async fn respond(&self, user_message: &str, ctx: TurnContext) -> DispatchResult {
        let result = self
            .dispatch(&self.config.system_prompt, user_message, ctx)
            .await;
        tracing::info!(tool = %result.tool_name, "Turn complete");
        result
    }
}

/// Loop state.
enum Phase {
    Reason,
    Act(VecDeque<ToolCall>),
    Done,
}

struct TurnLoop {
    reasoning: Reasoning,
    tools: Arc<ToolRegistry>,
    ctx: TurnContext,
    messages: Vec<ChatMessage>,
    iteration: usize,
    max_iterations: usize,
    phase: Phase,
}

impl TurnLoop {
    async fn next_step(&mut self) -> Option<AgentStep> {
        match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::Reason => self.reason().await,
            Phase::Act(calls) => self.act(calls).await,
            Phase::Done => None,
        }
    }

    async fn reason(&mut self) -> Option<AgentStep> {
        if self.iteration >= self.max_iterations {
            tracing::warn!(
                turn = %self.ctx.turn_id,
                max = self.max_iterations,
                "Agent step budget exhausted"
            );
            return None;
        }
        self.iteration += 1;

        let tools = self.tools.tool_definitions().await;
        let output = match self
            .reasoning
            .respond_with_tools(self.messages.clone(), tools)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(turn = %self.ctx.turn_id, error = %e, "Agent model call failed");
                return Some(AgentStep::agent_text(AGENT_FAILURE_REPLY));
            }
        };

        tracing::debug!(
            turn = %self.ctx.turn_id,
            iteration = self.iteration,
            tokens = output.usage.total(),
            "Agent model responded"
        );

        match output.result {
            RespondResult::Text(text) => {
                self.messages.push(ChatMessage::assistant(&text));
                Some(AgentStep::agent_text(text))
            }
            RespondResult::ToolCalls {
                tool_calls,
                content,
            } => {
                self.messages.push(ChatMessage::assistant_with_tool_calls(
                    content.clone(),
                    tool_calls.clone(),
                ));
                self.phase = Phase::Act(tool_calls.into());
                Some(AgentStep::Agent {
                    messages: vec![StepMessage {
                        name: None,
                        content,
                    }],
                })
            }
        }
    }

    async fn act(&mut self, mut calls: VecDeque<ToolCall>) -> Option<AgentStep> {
        let call = calls.pop_front()?;
        let output = self.execute_tool(&call).await;

        self.messages
            .push(ChatMessage::tool_result(&call.id, &call.name, &output));
        self.phase = if calls.is_empty() {
            Phase::Reason
        } else {
            Phase::Act(calls)
        };

        Some(AgentStep::Tool {
            messages: vec![StepMessage::tool_result(&call.name, output)],
            name: call.name,
        })
    }

    /// Execute one tool call. Failures become text fed back to the model.
    async fn execute_tool(&self, call: &ToolCall) -> String {
        let Some(tool) = self.tools.get(&call.name).await else {
            tracing::warn!(tool = %call.name, "Model requested an unknown tool");
            return format!(
                "Error: {}",
                ToolError::NotFound {
                    name: call.name.clone()
                }
            );
        };

        let start = Instant::now();
        tracing::info!(turn = %self.ctx.turn_id, tool = %call.name, "Running tool");
        match tool
            .execute(normalize_arguments(&call.arguments), &self.ctx)
            .await
        {
            Ok(output) => {
                tracing::debug!(
                    tool = %call.name,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Tool finished"
                );
                output.as_text()
            }
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool failed");
                format!("Error: {}", e)
            }
        }
    }
}

/// Some providers deliver arguments as a JSON-encoded string.
fn normalize_arguments(arguments: &serde_json::Value) -> serde_json::Value {
    match arguments {
        serde_json::Value::String(raw) => {
            serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!({}))
        }
        serde_json::Value::Null => serde_json::json!({}),
        other => other.clone(),
    }
}

// ── Tests ───────────────────────────────────────────────────────────
