//! Turn context: identifies the user turn a tool runs for.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Context for one user turn through the agent.
#[derive(Debug, Clone, Serialize)]
pub struct TurnContext {
    /// Unique turn ID.
    pub turn_id: Uuid,
    /// User the turn belongs to.
    pub user_id: String,
    /// Channel the message arrived on.
    pub channel: String,
    /// When the turn started.
    pub started_at: DateTime<Utc>,
}

impl Default for TurnContext {
    fn default() -> Self {
        Self {
            turn_id: Uuid::new_v4(),
            user_id: "default".to_string(),
            channel: "cli".to_string(),
            started_at: Utc::now(),
        }
    }
}

impl TurnContext {
    /// Create a context for a user on a channel.
    pub fn new(user_id: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            channel: channel.into(),
            ..Default::default()
        }
    }
}
