//! Mental-health specialist: therapeutic replies from the local model.
//!
//! `consult()` is total: backend and generation failures turn into fixed,
//! warm fallback replies and are never surfaced as errors.

use std::sync::Arc;

use crate::config::SpecialistConfig;
use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, create_specialist_provider};

/// Persona prompt that conditions every specialist reply.
pub const SPECIALIST_PERSONA: &str = r#"You are Dr. Emily Hartman, a warm and experienced clinical psychologist.
Respond to patients with:

1. Emotional attunement ("I can sense how difficult this must be...")
2. Gentle normalization ("Many people feel this way when...")
3. Practical guidance ("What sometimes helps is...")
4. Strengths-focused support ("I notice how you're...")

Key principles:
- Never use brackets or labels
- Blend elements seamlessly
- Vary sentence structure
- Use natural transitions
- Mirror the user's language level
- Always keep the conversation going by asking open ended questions to dive into the root cause of patients problem"#;

/// Returned when no local model is configured.
pub const BACKEND_UNAVAILABLE_REPLY: &str = "I'm having technical difficulties: language model backend is unavailable right now. Please try again later.";

/// Returned when the model call fails or produces nothing.
pub const GENERATION_FAILED_REPLY: &str = "I'm having technical difficulties, but I want you to know your feelings matter. Please try again shortly.";

const MAX_TOKENS: u32 = 350;
const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 0.9;

/// Therapeutic reply generator backed by an injected provider.
pub struct MentalHealthSpecialist {
    llm: Arc<dyn LlmProvider>,
}

impl MentalHealthSpecialist {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    pub fn from_config(config: &SpecialistConfig) -> Self {
        Self::new(create_specialist_provider(
            config.base_url.as_deref(),
            &config.model,
        ))
    }

    /// Generate a therapeutic reply to `query`. Always returns non-empty text.
    pub async fn consult(&self, query: &str) -> String {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(SPECIALIST_PERSONA),
            ChatMessage::user(query),
        ])
        .with_max_tokens(MAX_TOKENS)
        .with_temperature(TEMPERATURE)
        .with_top_p(TOP_P);

        match self.llm.complete(request).await {
            Ok(response) => {
                let reply = response.content.trim();
                if reply.is_empty() {
                    tracing::warn!(model = %self.llm.model_name(), "Specialist returned an empty reply");
                    GENERATION_FAILED_REPLY.to_string()
                } else {
                    reply.to_string()
                }
            }
            Err(LlmError::BackendUnavailable { provider }) => {
                tracing::warn!(%provider, "Specialist backend unavailable");
                BACKEND_UNAVAILABLE_REPLY.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Specialist generation failed");
                GENERATION_FAILED_REPLY.to_string()
            }
        }
    }
}
