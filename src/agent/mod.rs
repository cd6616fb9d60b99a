//! Agent module: the bounded reason/act loop and the step fold.

pub mod agent_loop;
pub mod step;

pub use agent_loop::{AGENT_FAILURE_REPLY, Agent, AgentDeps};
pub use step::{
    AgentStep, DispatchResult, NO_TOOL, StepMessage, parse_response, parse_response_stream,
};
