//! The service-layer error type.

use omsorg_llm::GatewayError;
use omsorg_store::StoreError;
use thiserror::Error;

/// Failures surfaced by the orchestrator and the consent/escalation services.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The conversation does not exist or belongs to someone else. The two
    /// cases collapse so a caller cannot probe which ids exist.
    #[error("unauthorized access to conversation")]
    Unauthorized,

    /// Rejected input, before anything was persisted.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// The LLM gateway failed. Raised after the failure was audited; the
    /// patient's message stays persisted.
    #[error("generation failed: {0}")]
    Generation(#[from] GatewayError),
}

/// Convenience alias for service results.
pub type ChatResult<T> = Result<T, ChatError>;
