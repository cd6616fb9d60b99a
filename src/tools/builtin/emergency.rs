//! `emergency_call_tool`: calls the configured emergency contact.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::context::TurnContext;
use crate::telephony::EmergencyDialer;
use crate::tools::tool::{Tool, ToolError, ToolOutput};

pub const NAME: &str = "emergency_call_tool";

/// Tool wrapping `EmergencyDialer::call_emergency`. Places at most one call
/// per invocation.
pub struct EmergencyCallTool {
    dialer: Arc<EmergencyDialer>,
}

impl EmergencyCallTool {
    pub fn new(dialer: Arc<EmergencyDialer>) -> Self {
        Self { dialer }
    }
}

#[async_trait]
impl Tool for EmergencyCallTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Place an emergency call to the safety helpline's phone number. \
         Use this only if the user expresses suicidal ideation, intent to self-harm, \
         or describes a mental health emergency requiring immediate help."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn execute(
        &self,
        _params: serde_json::Value,
        ctx: &TurnContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        tracing::warn!(turn = %ctx.turn_id, user = %ctx.user_id, "Emergency call requested");

        let result = match self.dialer.call_emergency().await {
            Some(record) => serde_json::json!({
                "status": "call_placed",
                "call_sid": record.sid,
            }),
            None => serde_json::json!({
                "status": "call_not_placed",
                "message": "The emergency call could not be placed. Encourage the user to contact a local crisis hotline or emergency services right away.",
            }),
        };

        Ok(ToolOutput::success(result, start.elapsed()))
    }
}
