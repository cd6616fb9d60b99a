//! Emergency calling: places one outbound voice call to the configured
//! emergency contact.
//!
//! `EmergencyDialer::call_emergency()` never fails: an unconfigured or
//! failing telephony client is logged and reported as `None`.

mod twilio;

pub use twilio::TwilioClient;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::TelephonyConfig;
use crate::error::TelephonyError;

/// An outbound call to place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub to: String,
    pub from: String,
    /// Remote voice-prompt resource the call is directed to.
    pub url: String,
}

/// The telephony API's record of a created call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
}

/// A voice-call backend.
#[async_trait]
pub trait Telephony: Send + Sync {
    async fn create_call(&self, request: &CallRequest) -> Result<CallRecord, TelephonyError>;
}

/// Stand-in for a telephony account that is not configured.
pub struct UnconfiguredTelephony;

#[async_trait]
impl Telephony for UnconfiguredTelephony {
    async fn create_call(&self, _request: &CallRequest) -> Result<CallRecord, TelephonyError> {
        Err(TelephonyError::NotConfigured)
    }
}

/// Places the emergency call.
pub struct EmergencyDialer {
    telephony: Arc<dyn Telephony>,
    request: CallRequest,
}

impl EmergencyDialer {
    pub fn new(telephony: Arc<dyn Telephony>, request: CallRequest) -> Self {
        Self { telephony, request }
    }

    /// Dialer whose every call attempt reports "not configured".
    pub fn unconfigured() -> Self {
        Self::new(
            Arc::new(UnconfiguredTelephony),
            CallRequest {
                to: String::new(),
                from: String::new(),
                url: String::new(),
            },
        )
    }

    pub fn from_config(config: Option<&TelephonyConfig>) -> Self {
        match config {
            Some(config) => {
                tracing::info!(to = %config.emergency_contact, "Emergency calling enabled");
                Self::new(
                    Arc::new(TwilioClient::new(
                        &config.base_url,
                        &config.account_sid,
                        config.auth_token.clone(),
                    )),
                    CallRequest {
                        to: config.emergency_contact.clone(),
                        from: config.from_number.clone(),
                        url: config.voice_url.clone(),
                    },
                )
            }
            None => {
                tracing::warn!("Telephony credentials missing; emergency calls are disabled");
                Self::unconfigured()
            }
        }
    }

    /// Place one call to the emergency contact. Never retries.
    pub async fn call_emergency(&self) -> Option<CallRecord> {
        match self.telephony.create_call(&self.request).await {
            Ok(record) => {
                tracing::info!(sid = %record.sid, "Emergency call placed");
                Some(record)
            }
            Err(TelephonyError::NotConfigured) => {
                tracing::warn!("Telephony client not available; cannot place emergency call");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to place emergency call");
                None
            }
        }
    }
}
