//! `locate_therapist_tool`: nearby therapists from the geocoder.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::context::TurnContext;
use crate::locator::TherapistLocator;
use crate::tools::tool::{Tool, ToolError, ToolOutput, require_str};

pub const NAME: &str = "locate_therapist_tool";

/// Tool wrapping `TherapistLocator::locate`.
pub struct LocateTherapistTool {
    locator: Arc<TherapistLocator>,
}

impl LocateTherapistTool {
    pub fn new(locator: Arc<TherapistLocator>) -> Self {
        Self { locator }
    }
}

#[async_trait]
impl Tool for LocateTherapistTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Find licensed therapists, psychologists, and mental health clinics near a location \
         using OpenStreetMap. Use this when the user asks for nearby professional help. \
         Returns names, addresses, and coordinates as readable text."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city or area in which the user is seeking therapy support"
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &TurnContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let location = require_str(&params, "location")?.trim();
        tracing::debug!(turn = %ctx.turn_id, %location, "Locating therapists");
        let listing = self.locator.locate(location).await;
        Ok(ToolOutput::text(listing, start.elapsed()))
    }
}
