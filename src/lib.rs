//! SafeSpace: mental-health support agent core.

pub mod agent;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod locator;
pub mod specialist;
pub mod telephony;
pub mod tools;
