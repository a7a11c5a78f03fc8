//! These models represent the objects passed around by the agent
//!
//! The agent speaks a single wire format (OpenAI-style chat completions), but the
//! internal models stay independent of it: providers convert to and from these
//! structs using the helpers in `providers::utils`.
pub mod message;
pub mod role;
pub mod tool;
