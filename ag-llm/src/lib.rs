//! Responses API client for agentgram.
//!
//! Pure HTTP client: one completion call in, generated text plus a
//! continuation id out. No session logic lives here.

mod client;
mod error;
mod types;

pub use client::{CompletionApi, ResponsesClient};
pub use error::{LlmError, Result};
pub use types::{AgentSelector, Completion, CompletionRequest};
