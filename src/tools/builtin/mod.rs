//! Built-in tools: therapeutic reply, therapist search, emergency call.

pub mod emergency;
pub mod locate;
pub mod specialist;

pub use emergency::EmergencyCallTool;
pub use locate::LocateTherapistTool;
pub use specialist::AskSpecialistTool;
