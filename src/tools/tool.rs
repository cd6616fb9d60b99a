//! The `Tool` trait and its output type.

use std::time::Duration;

use async_trait::async_trait;

use crate::context::TurnContext;

pub use crate::error::ToolError;

/// Output of a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub result: serde_json::Value,
    pub duration: Duration,
}

impl ToolOutput {
    /// Plain-text output.
    pub fn text(text: impl Into<String>, duration: Duration) -> Self {
        Self {
            result: serde_json::Value::String(text.into()),
            duration,
        }
    }

    /// Structured output.
    pub fn success(result: serde_json::Value, duration: Duration) -> Self {
        Self { result, duration }
    }

    /// Render the output as the text fed back to the model.
    pub fn as_text(&self) -> String {
        match &self.result {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A capability the agent can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses to call the tool.
    fn name(&self) -> &str;

    /// Tells the model when to use the tool.
    fn description(&self) -> &str;

    /// JSON schema of the parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &TurnContext,
    ) -> Result<ToolOutput, ToolError>;
}

/// Extract a required, non-blank string parameter.
pub fn require_str<'a>(params: &'a serde_json::Value, name: &str) -> Result<&'a str, ToolError> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing '{}' string parameter", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_str_present() {
        let params = serde_json::json!({"location": "Austin"});
        assert_eq!(require_str(&params, "location").unwrap(), "Austin");
    }

    #[test]
    fn test_require_str_missing_or_blank() {
        assert!(require_str(&serde_json::json!({}), "location").is_err());
        assert!(require_str(&serde_json::json!({"location": "  "}), "location").is_err());
        assert!(require_str(&serde_json::json!({"location": 3}), "location").is_err());
    }

    #[test]
    fn test_output_as_text() {
        let text = ToolOutput::text("hello", Duration::ZERO);
        assert_eq!(text.as_text(), "hello");

        let json = ToolOutput::success(serde_json::json!({"status": "ok"}), Duration::ZERO);
        assert_eq!(json.as_text(), r#"{"status":"ok"}"#);
    }
}
