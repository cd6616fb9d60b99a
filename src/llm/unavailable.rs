//! Stand-in provider for a backend that is not configured.

use async_trait::async_trait;

use crate::error::LlmError;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, LlmProvider, ToolCompletionRequest,
    ToolCompletionResponse,
};

/// Provider that fails every call with `LlmError::BackendUnavailable`
/// without touching the network.
#[derive(Debug, Clone)]
pub struct UnavailableProvider {
    provider: String,
}

impl UnavailableProvider {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }

    fn error(&self) -> LlmError {
        LlmError::BackendUnavailable {
            provider: self.provider.clone(),
        }
    }
}

#[async_trait]
impl LlmProvider for UnavailableProvider {
    fn model_name(&self) -> &str {
        "unavailable"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Err(self.error())
    }

    async fn complete_with_tools(
        &self,
        _request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse, LlmError> {
        Err(self.error())
    }
}
