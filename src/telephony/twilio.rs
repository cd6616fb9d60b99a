//! Twilio voice-call client.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::TelephonyError;
use crate::telephony::{CallRecord, CallRequest, Telephony};

/// Client for the Twilio REST API (`Calls` resource).
pub struct TwilioClient {
    client: Client,
    base_url: String,
    account_sid: String,
    auth_token: SecretString,
}

/// Error body returned by Twilio on rejected requests.
#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl TwilioClient {
    pub fn new(base_url: &str, account_sid: &str, auth_token: SecretString) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            account_sid: account_sid.to_string(),
            auth_token,
        }
    }

    fn calls_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.base_url, self.account_sid
        )
    }
}

#[async_trait]
impl Telephony for TwilioClient {
    async fn create_call(&self, request: &CallRequest) -> Result<CallRecord, TelephonyError> {
        let response = self
            .client
            .post(self.calls_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&[
                ("To", request.to.as_str()),
                ("From", request.from.as_str()),
                ("Url", request.url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| TelephonyError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TwilioErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(body);
            return Err(TelephonyError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<CallRecord>()
            .await
            .map_err(|e| TelephonyError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calls_url() {
        let client = TwilioClient::new(
            "https://api.twilio.com/",
            "AC123",
            SecretString::from("token"),
        );
        assert_eq!(
            client.calls_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Calls.json"
        );
    }

    #[test]
    fn test_error_body_message_extracted() {
        let body: TwilioErrorBody =
            serde_json::from_str(r#"{"code": 21211, "message": "Invalid 'To' Phone Number", "status": 400}"#)
                .unwrap();
        assert_eq!(body.message.as_deref(), Some("Invalid 'To' Phone Number"));
    }
}
