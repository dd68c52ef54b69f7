//! The [`Gateway`] trait and its error surface.

use async_trait::async_trait;
use omsorg_core::messages::PromptMessage;
use thiserror::Error;

/// Errors produced by a gateway implementation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The HTTP request itself failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint rejected our credentials.
    #[error("auth error: {message}")]
    Auth {
        /// Error description.
        message: String,
    },

    /// The endpoint asked us to back off.
    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited {
        /// Suggested retry delay in milliseconds.
        retry_after_ms: u64,
        /// Error description.
        message: String,
    },

    /// Any other non-success response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },
}

/// Convenience alias for gateway results.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// One completed (non-streamed) model turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    /// Assistant text. `None` when the endpoint returned no usable choice;
    /// the orchestrator substitutes its apology fallback.
    pub content: Option<String>,
    /// Model identifier the endpoint reports having served.
    pub model: String,
}

/// The seam between the orchestrator and whatever serves completions.
///
/// Implementations take the fully assembled prompt (system preamble plus
/// bounded history plus the current turn) and return one completion. They do
/// not retry; deciding what a failure means is the orchestrator's job.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Request one completion for `prompt`.
    async fn complete(&self, prompt: &[PromptMessage]) -> GatewayResult<Completion>;
}
