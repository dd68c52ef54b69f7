//! OpenAI-compatible chat completions client.

pub mod provider;
pub mod types;

pub use provider::OpenAiGateway;
pub use types::{DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiConfig};
