//! LLM integration for SafeSpace.
//!
//! Two kinds of backend sit behind the `LlmProvider` trait:
//! - **Hosted agent model** (OpenAI or Anthropic) via rig-core, used by the
//!   dispatcher for tool selection. `RigAdapter` bridges rig's
//!   `CompletionModel` trait to `LlmProvider`.
//! - **Local specialist model** via Ollama's native chat API, used for
//!   therapeutic replies.
//!
//! `UnavailableProvider` stands in for a backend that is not configured.

mod ollama;
pub mod provider;
pub mod reasoning;
mod rig_adapter;
mod unavailable;

pub use ollama::OllamaProvider;
pub use provider::*;
pub use reasoning::{Reasoning, RespondOutput, RespondResult, TokenUsage};
pub use rig_adapter::RigAdapter;
pub use unavailable::UnavailableProvider;

use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::error::LlmError;

/// Supported hosted backends for the agent model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
}

/// Configuration for creating the agent's LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
    /// Overrides the provider's public endpoint (proxies, gateways).
    pub base_url: Option<String>,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.backend {
        LlmBackend::Anthropic => create_anthropic_provider(config),
        LlmBackend::OpenAi => create_openai_provider(config),
    }
}

fn create_anthropic_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::anthropic;

    let mut builder = anthropic::Client::builder().api_key(config.api_key.expose_secret());
    if let Some(url) = &config.base_url {
        builder = builder.base_url(url);
    }
    let client: rig::client::Client<anthropic::client::AnthropicExt> =
        builder.build().map_err(|e| LlmError::RequestFailed {
            provider: "anthropic".to_string(),
            reason: format!("Failed to create Anthropic client: {}", e),
        })?;

    let model = client.completion_model(&config.model);
    tracing::info!("Agent model: Anthropic ({})", config.model);
    Ok(Arc::new(RigAdapter::new(model, &config.model)))
}

fn create_openai_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::openai;

    let mut builder = openai::Client::builder().api_key(config.api_key.expose_secret());
    if let Some(url) = &config.base_url {
        builder = builder.base_url(url);
    }
    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        builder.build().map_err(|e| LlmError::RequestFailed {
            provider: "openai".to_string(),
            reason: format!("Failed to create OpenAI client: {}", e),
        })?;

    let model = client.completion_model(&config.model);
    tracing::info!("Agent model: OpenAI ({})", config.model);
    Ok(Arc::new(RigAdapter::new(model, &config.model)))
}

/// Create the local specialist provider, or the unavailable stand-in when no
/// base URL is configured.
pub fn create_specialist_provider(base_url: Option<&str>, model: &str) -> Arc<dyn LlmProvider> {
    match base_url {
        Some(url) => {
            tracing::info!("Specialist model: Ollama at {} ({})", url, model);
            Arc::new(OllamaProvider::new(url, model))
        }
        None => {
            tracing::warn!("Specialist model disabled; therapeutic replies will use a fallback");
            Arc::new(UnavailableProvider::new("ollama"))
        }
    }
}
