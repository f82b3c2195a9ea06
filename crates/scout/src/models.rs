//! These models represent the objects passed around by the agent
//!
//! There are two related formats in play:
//! - openai chat-completion messages/tools, sent over the wire to the LLM
//! - tool requests/responses, exchanged between the agent and the systems
//!   providing capabilities
//!
//! Wire payloads are converted to and from these internal structs at the
//! provider boundary (see `providers::utils`); the rest of the crate only
//! ever sees the internal form.
pub mod content;
pub mod message;
pub mod role;
pub mod tool;
