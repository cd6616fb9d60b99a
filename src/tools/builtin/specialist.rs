//! `ask_mental_health_specialist`: therapeutic reply from the local model.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::context::TurnContext;
use crate::specialist::MentalHealthSpecialist;
use crate::tools::tool::{Tool, ToolError, ToolOutput, require_str};

pub const NAME: &str = "ask_mental_health_specialist";

/// Tool wrapping `MentalHealthSpecialist::consult`.
pub struct AskSpecialistTool {
    specialist: Arc<MentalHealthSpecialist>,
}

impl AskSpecialistTool {
    pub fn new(specialist: Arc<MentalHealthSpecialist>) -> Self {
        Self { specialist }
    }
}

#[async_trait]
impl Tool for AskSpecialistTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Generate a therapeutic response using the mental health specialist model. \
         Use this for all general user queries, mental health questions, emotional concerns, \
         or to offer empathetic, evidence-based guidance in a conversational tone."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The user's message or concern, in their own words"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &TurnContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let query = require_str(&params, "query")?;
        let reply = self.specialist.consult(query).await;
        Ok(ToolOutput::text(reply, start.elapsed()))
    }
}
