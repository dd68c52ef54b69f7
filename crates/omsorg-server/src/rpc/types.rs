//! RPC wire types.
//!
//! A request is a JSON object posted to `/rpc`:
//!
//! ```json
//! { "method": "chat.send", "params": { "message": "hej" } }
//! ```
//!
//! On success the handler's result object is the response body. On failure
//! the body is `{ "error": { "code": "...", "message": "..." } }` with a
//! matching HTTP status.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An incoming RPC request.
#[derive(Clone, Debug, Deserialize)]
pub struct RpcRequest {
    /// Dotted method name, e.g. `chat.send`.
    pub method: String,
    /// Method parameters. Optional; handlers validate their own.
    #[serde(default)]
    pub params: Option<Value>,
}

/// The error body shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// The error envelope.
    pub error: ErrorDetail,
}

/// Code and message inside the error envelope.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable machine-readable code, e.g. `invalid_params`.
    pub code: String,
    /// Human-readable message, sanitized for clients.
    pub message: String,
}

impl ErrorBody {
    /// Build an error body from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
