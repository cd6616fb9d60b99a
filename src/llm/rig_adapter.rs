//! Bridges rig-core's `CompletionModel` to our `LlmProvider` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use rig::OneOrMany;
use rig::completion::{CompletionModel, Message};
use rig::message::{AssistantContent, ToolResultContent, UserContent};

use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role, ToolCall,
    ToolCompletionRequest, ToolCompletionResponse, ToolDefinition,
};

/// Adapter that drives any rig completion model.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
}

impl<M> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

/// Messages split into the shape rig expects.
struct RigMessages {
    preamble: Option<String>,
    history: Vec<Message>,
    prompt: Message,
}

fn to_rig_messages(messages: &[ChatMessage]) -> Result<RigMessages, LlmError> {
    let mut preamble: Vec<&str> = Vec::new();
    let mut converted: Vec<Message> = Vec::with_capacity(messages.len());
    // Tool results must echo the provider call id of the call they answer.
    let mut call_ids: HashMap<&str, &str> = HashMap::new();

    for msg in messages {
        match msg.role {
            Role::System => preamble.push(&msg.content),
            Role::User => converted.push(Message::user(msg.content.clone())),
            Role::Assistant => match msg.tool_calls.as_deref() {
                Some(calls) if !calls.is_empty() => {
                    let mut content = Vec::with_capacity(calls.len() + 1);
                    if !msg.content.is_empty() {
                        content.push(AssistantContent::text(msg.content.clone()));
                    }
                    for call in calls {
                        content.push(match &call.call_id {
                            Some(call_id) => {
                                call_ids.insert(&call.id, call_id);
                                AssistantContent::tool_call_with_call_id(
                                    call.id.clone(),
                                    call_id.clone(),
                                    call.name.clone(),
                                    call.arguments.clone(),
                                )
                            }
                            None => AssistantContent::tool_call(
                                call.id.clone(),
                                call.name.clone(),
                                call.arguments.clone(),
                            ),
                        });
                    }
                    let content = OneOrMany::many(content).map_err(|e| LlmError::InvalidResponse {
                        provider: "rig".to_string(),
                        reason: format!("empty assistant turn: {}", e),
                    })?;
                    converted.push(Message::Assistant { id: None, content });
                }
                _ => converted.push(Message::assistant(msg.content.clone())),
            },
            Role::Tool => {
                let id = msg.tool_call_id.clone().unwrap_or_default();
                let result = OneOrMany::one(ToolResultContent::text(msg.content.clone()));
                let content = match call_ids.get(id.as_str()) {
                    Some(call_id) => {
                        UserContent::tool_result_with_call_id(id, call_id.to_string(), result)
                    }
                    None => UserContent::tool_result(id, result),
                };
                converted.push(Message::User {
                    content: OneOrMany::one(content),
                });
            }
        }
    }

    let prompt = converted.pop().ok_or_else(|| LlmError::RequestFailed {
        provider: "rig".to_string(),
        reason: "no user or tool message to send".to_string(),
    })?;

    Ok(RigMessages {
        preamble: (!preamble.is_empty()).then(|| preamble.join("\n\n")),
        history: converted,
        prompt,
    })
}

fn to_rig_tools(tools: &[ToolDefinition]) -> Vec<rig::completion::ToolDefinition> {
    tools
        .iter()
        .map(|t| rig::completion::ToolDefinition {
            name: t.name.clone(),
            description: t.description.clone(),
            parameters: t.parameters.clone(),
        })
        .collect()
}

/// Text and tool calls out of a rig choice.
fn split_choice(choice: &OneOrMany<AssistantContent>) -> (Option<String>, Vec<ToolCall>) {
    let mut text: Vec<String> = Vec::new();
    let mut tool_calls = Vec::new();

    for content in choice.iter() {
        match content {
            AssistantContent::Text(t) => text.push(t.text.clone()),
            AssistantContent::ToolCall(tc) => tool_calls.push(ToolCall {
                id: tc.id.clone(),
                call_id: tc.call_id.clone(),
                name: tc.function.name.clone(),
                arguments: tc.function.arguments.clone(),
            }),
            _ => {}
        }
    }

    let text = text.join("");
    ((!text.is_empty()).then_some(text), tool_calls)
}

impl<M> RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    async fn run(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        top_p: Option<f32>,
    ) -> Result<(Option<String>, Vec<ToolCall>, u32, u32), LlmError> {
        let RigMessages {
            preamble,
            history,
            prompt,
        } = to_rig_messages(messages)?;

        let mut builder = self
            .model
            .completion_request(prompt)
            .messages(history)
            .tools(to_rig_tools(tools));
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }
        if let Some(t) = temperature {
            builder = builder.temperature(f64::from(t));
        }
        if let Some(m) = max_tokens {
            builder = builder.max_tokens(u64::from(m));
        }
        if let Some(p) = top_p {
            builder = builder.additional_params(serde_json::json!({ "top_p": p }));
        }

        let response = self
            .model
            .completion(builder.build())
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: self.model_name.clone(),
                reason: e.to_string(),
            })?;

        let (text, tool_calls) = split_choice(&response.choice);
        Ok((
            text,
            tool_calls,
            response.usage.input_tokens as u32,
            response.usage.output_tokens as u32,
        ))
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let (text, _, input_tokens, output_tokens) = self
            .run(
                &request.messages,
                &[],
                request.max_tokens,
                request.temperature,
                request.top_p,
            )
            .await?;
        Ok(CompletionResponse {
            content: text.unwrap_or_default(),
            input_tokens,
            output_tokens,
            finish_reason: FinishReason::Stop,
        })
    }

    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse, LlmError> {
        let (content, tool_calls, input_tokens, output_tokens) = self
            .run(
                &request.messages,
                &request.tools,
                request.max_tokens,
                request.temperature,
                None,
            )
            .await?;
        let finish_reason = if tool_calls.is_empty() {
            FinishReason::Stop
        } else {
            FinishReason::ToolUse
        };
        Ok(ToolCompletionResponse {
            content,
            tool_calls,
            input_tokens,
            output_tokens,
            finish_reason,
        })
    }
}
