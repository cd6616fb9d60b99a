//! Error types for SafeSpace.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} is not available")]
    BackendUnavailable { provider: String },

    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} does not support {feature}")]
    Unsupported { provider: String, feature: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tool execution errors.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool {name} not found")]
    NotFound { name: String },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Geocoding/search errors.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    Request(String),

    #[error("Geocoding service returned HTTP {status}")]
    Status { status: u16 },

    #[error("Malformed geocoding response: {0}")]
    Decode(String),
}

/// Telephony API errors.
#[derive(Debug, thiserror::Error)]
pub enum TelephonyError {
    #[error("Telephony client is not configured")]
    NotConfigured,

    #[error("Call request failed: {0}")]
    Request(String),

    #[error("Call rejected with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed call record: {0}")]
    Decode(String),
}
