// src/llm/mod.rs
// Completion service client, retry wrapper, and structured output schemas

mod client;
mod retry;
pub mod schema;

pub use client::{CompletionBackend, CompletionRequest, Message, OpenAiClient};
pub use retry::{MAX_RETRIES, RETRY_DELAYS, call_with_retry};
