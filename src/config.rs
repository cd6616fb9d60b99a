//! Configuration types.
//!
//! Everything is read from the process environment once at startup. Missing
//! telephony credentials or a disabled local model are not errors: the
//! corresponding client is built in its unavailable variant instead.

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Default system prompt for the dispatching agent.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an AI engine supporting mental health conversations with warmth and vigilance.
You have access to three tools:

1. `ask_mental_health_specialist`: Use this tool to answer all emotional or psychological queries with therapeutic guidance.
2. `locate_therapist_tool`: Use this tool if the user asks about nearby therapists or if recommending local professional help would be beneficial.
3. `emergency_call_tool`: Use this immediately if the user expresses suicidal thoughts, self-harm intentions, or is in crisis.

Always take necessary action. Respond kindly, clearly, and supportively."#;

const DEFAULT_AGENT_MODEL: &str = "gpt-4";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_SPECIALIST_MODEL: &str = "alibayram/medgemma:4b";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_USER_AGENT: &str = "SafeSpace-AI-Therapist/1.0";
const DEFAULT_TWILIO_URL: &str = "https://api.twilio.com";
const DEFAULT_VOICE_URL: &str = "http://demo.twilio.com/docs/voice.xml";

/// Agent loop configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum model turns per user message before the loop stops.
    pub max_iterations: usize,
    /// Sampling temperature for tool selection.
    pub temperature: f32,
    /// System prompt prepended to every turn.
    pub system_prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            temperature: 0.2,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Local language model used for therapeutic replies.
#[derive(Debug, Clone)]
pub struct SpecialistConfig {
    /// Ollama base URL, or `None` when the local model is disabled.
    pub base_url: Option<String>,
    pub model: String,
}

/// Geocoding/search endpoint.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
}

/// Telephony account. Only constructed when every credential is present.
#[derive(Debug, Clone)]
pub struct TelephonyConfig {
    pub base_url: String,
    pub account_sid: String,
    pub auth_token: SecretString,
    pub from_number: String,
    pub emergency_contact: String,
    pub voice_url: String,
}

/// Full process configuration.
#[derive(Debug, Clone)]
pub struct SafeSpaceConfig {
    pub agent: AgentConfig,
    pub llm: LlmConfig,
    pub specialist: SpecialistConfig,
    pub geocoder: GeocoderConfig,
    pub telephony: Option<TelephonyConfig>,
}

impl SafeSpaceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("SAFESPACE_AGENT_BACKEND").as_deref() {
            Some("openai") => LlmBackend::OpenAi,
            Some("anthropic") => LlmBackend::Anthropic,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "SAFESPACE_AGENT_BACKEND".to_string(),
                    message: format!("unknown backend '{}', expected openai or anthropic", other),
                });
            }
            // No explicit backend: follow whichever key is present.
            None if get("OPENAI_API_KEY").is_none() && get("ANTHROPIC_API_KEY").is_some() => {
                LlmBackend::Anthropic
            }
            None => LlmBackend::OpenAi,
        };

        let (key_var, default_model) = match backend {
            LlmBackend::OpenAi => ("OPENAI_API_KEY", DEFAULT_AGENT_MODEL),
            LlmBackend::Anthropic => ("ANTHROPIC_API_KEY", DEFAULT_ANTHROPIC_MODEL),
        };
        let api_key = get(key_var).ok_or_else(|| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let max_iterations = match get("SAFESPACE_MAX_ITERATIONS") {
            Some(raw) => parse_positive(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "SAFESPACE_MAX_ITERATIONS".to_string(),
                message: format!("expected a positive integer, got '{}'", raw),
            })?,
            None => AgentConfig::default().max_iterations,
        };

        let agent = AgentConfig {
            max_iterations,
            system_prompt: get("SAFESPACE_SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            ..AgentConfig::default()
        };

        let llm = LlmConfig {
            backend,
            api_key: SecretString::from(api_key),
            model: get("SAFESPACE_AGENT_MODEL").unwrap_or_else(|| default_model.to_string()),
            base_url: get("SAFESPACE_AGENT_BASE_URL"),
        };

        let specialist = SpecialistConfig {
            base_url: match get("OLLAMA_BASE_URL") {
                Some(url) if url.eq_ignore_ascii_case("off") => None,
                Some(url) => Some(url),
                None => Some(DEFAULT_OLLAMA_URL.to_string()),
            },
            model: get("SAFESPACE_SPECIALIST_MODEL")
                .unwrap_or_else(|| DEFAULT_SPECIALIST_MODEL.to_string()),
        };

        let geocoder = GeocoderConfig {
            base_url: get("NOMINATIM_BASE_URL").unwrap_or_else(|| DEFAULT_NOMINATIM_URL.to_string()),
            user_agent: get("SAFESPACE_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };

        let telephony = match (
            get("TWILIO_ACCOUNT_SID"),
            get("TWILIO_AUTH_TOKEN"),
            get("TWILIO_FROM_NUMBER"),
            get("EMERGENCY_CONTACT"),
        ) {
            (Some(account_sid), Some(auth_token), Some(from_number), Some(emergency_contact)) => {
                Some(TelephonyConfig {
                    base_url: get("TWILIO_BASE_URL").unwrap_or_else(|| DEFAULT_TWILIO_URL.to_string()),
                    account_sid,
                    auth_token: SecretString::from(auth_token),
                    from_number,
                    emergency_contact,
                    voice_url: get("SAFESPACE_VOICE_URL")
                        .unwrap_or_else(|| DEFAULT_VOICE_URL.to_string()),
                })
            }
            _ => None,
        };

        Ok(Self {
            agent,
            llm,
            specialist,
            geocoder,
            telephony,
        })
    }
}

fn parse_positive(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_only_api_key() {
        let config = SafeSpaceConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();

        assert_eq!(config.llm.backend, LlmBackend::OpenAi);
        assert_eq!(config.llm.model, "gpt-4");
        assert_eq!(config.agent.max_iterations, 5);
        assert!((config.agent.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.agent.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(
            config.specialist.base_url.as_deref(),
            Some("http://localhost:11434")
        );
        assert_eq!(config.specialist.model, "alibayram/medgemma:4b");
        assert_eq!(config.geocoder.user_agent, "SafeSpace-AI-Therapist/1.0");
        assert!(config.telephony.is_none());
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let err = SafeSpaceConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "OPENAI_API_KEY"));
    }

    #[test]
    fn test_partial_telephony_credentials_leave_it_unconfigured() {
        let config = SafeSpaceConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "secret"),
        ]))
        .unwrap();
        assert!(config.telephony.is_none());
    }

    #[test]
    fn test_full_telephony_credentials() {
        let config = SafeSpaceConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "secret"),
            ("TWILIO_FROM_NUMBER", "+15550001111"),
            ("EMERGENCY_CONTACT", "+15559998888"),
        ]))
        .unwrap();
        let telephony = config.telephony.unwrap();
        assert_eq!(telephony.account_sid, "AC123");
        assert_eq!(telephony.emergency_contact, "+15559998888");
        assert_eq!(telephony.voice_url, "http://demo.twilio.com/docs/voice.xml");
    }

    #[test]
    fn test_ollama_can_be_disabled() {
        let config = SafeSpaceConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OLLAMA_BASE_URL", "off"),
        ]))
        .unwrap();
        assert!(config.specialist.base_url.is_none());
    }

    #[test]
    fn test_invalid_iterations_rejected() {
        let err = SafeSpaceConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("SAFESPACE_MAX_ITERATIONS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = SafeSpaceConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("SAFESPACE_AGENT_BACKEND", "llamafile"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "SAFESPACE_AGENT_BACKEND"));
    }

    #[test]
    fn test_anthropic_key_alone_selects_anthropic() {
        let config =
            SafeSpaceConfig::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "sk-ant-test")])).unwrap();
        assert_eq!(config.llm.backend, LlmBackend::Anthropic);
        assert_eq!(config.llm.model, "claude-sonnet-4-20250514");
        assert_eq!(config.llm.api_key.expose_secret(), "sk-ant-test");
    }

    #[test]
    fn test_explicit_backend_requires_its_own_key() {
        let err = SafeSpaceConfig::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "sk-ant-test"),
            ("SAFESPACE_AGENT_BACKEND", "openai"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "OPENAI_API_KEY"));

        let err = SafeSpaceConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("SAFESPACE_AGENT_BACKEND", "anthropic"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_openai_key_wins_when_both_present() {
        let config = SafeSpaceConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("ANTHROPIC_API_KEY", "sk-ant-test"),
            ("SAFESPACE_AGENT_BASE_URL", "http://127.0.0.1:8089/v1"),
        ]))
        .unwrap();
        assert_eq!(config.llm.backend, LlmBackend::OpenAi);
        assert_eq!(config.llm.api_key.expose_secret(), "sk-test");
        assert_eq!(config.llm.base_url.as_deref(), Some("http://127.0.0.1:8089/v1"));
    }
}
