//! RPC error type and its mapping to HTTP statuses and wire codes.
//!
//! Internal failure detail (storage, gateway) is logged server-side and
//! replaced with a generic client message. Validation and not-found errors
//! keep their messages since the caller needs them to correct the request.

use axum::http::StatusCode;
use omsorg_chat::ChatError;
use omsorg_llm::GatewayError;
use omsorg_store::StoreError;
use thiserror::Error;

/// Wire code for an unknown method name.
pub const METHOD_NOT_FOUND: &str = "method_not_found";
/// Wire code for an escalation id that matched no row.
pub const ESCALATION_NOT_FOUND: &str = "escalation_not_found";

/// Errors raised by RPC dispatch and method handlers.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Malformed or missing parameters.
    #[error("{message}")]
    InvalidParams {
        /// What was wrong, safe to show the caller.
        message: String,
    },

    /// The caller may not touch the referenced resource.
    #[error("unauthorized")]
    Unauthorized,

    /// The caller has not granted the consent the operation requires.
    #[error("data processing consent required")]
    ConsentRequired,

    /// The named thing does not exist.
    #[error("{message}")]
    NotFound {
        /// Which not-found case, as a wire code.
        code: &'static str,
        /// What was not found, safe to show the caller.
        message: String,
    },

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// The LLM gateway failed.
    #[error("generation failed: {0}")]
    Generation(#[from] GatewayError),

    /// Anything else that should not leak detail to the caller.
    #[error("{message}")]
    Internal {
        /// Server-side detail, logged but never sent to the client.
        message: String,
    },
}

impl RpcError {
    /// Shorthand for an invalid-params error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// The stable wire code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParams { .. } => "invalid_params",
            Self::Unauthorized => "unauthorized",
            Self::ConsentRequired => "consent_required",
            Self::NotFound { code, .. } => code,
            Self::Storage(_) => "storage_error",
            Self::Generation(_) => "generation_failed",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// The HTTP status this error maps to.
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidParams { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::ConsentRequired => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Generation(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// The message sent to the client. Internal failure detail is stripped;
    /// the full error is logged where it is raised.
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidParams { message }
            | Self::NotFound { message, .. } => message.clone(),
            Self::Unauthorized => "unauthorized".to_string(),
            Self::ConsentRequired => {
                "data processing consent required".to_string()
            }
            Self::Storage(_) => "storage error".to_string(),
            Self::Generation(_) => {
                "failed to generate a response".to_string()
            }
            Self::Internal { .. } => "internal error".to_string(),
        }
    }
}

impl From<ChatError> for RpcError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Unauthorized => Self::Unauthorized,
            ChatError::Validation(message) => Self::InvalidParams { message },
            ChatError::Storage(e) => Self::Storage(e),
            ChatError::Generation(e) => Self::Generation(e),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn codes_and_statuses() {
        let cases: Vec<(RpcError, &str, StatusCode)> = vec![
            (
                RpcError::invalid_params("missing field: message"),
                "invalid_params",
                StatusCode::BAD_REQUEST,
            ),
            (RpcError::Unauthorized, "unauthorized", StatusCode::UNAUTHORIZED),
            (
                RpcError::ConsentRequired,
                "consent_required",
                StatusCode::FORBIDDEN,
            ),
            (
                RpcError::NotFound {
                    code: METHOD_NOT_FOUND,
                    message: "unknown method: nope".to_string(),
                },
                "method_not_found",
                StatusCode::NOT_FOUND,
            ),
            (
                RpcError::Internal {
                    message: "wiring broke".to_string(),
                },
                "internal_error",
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, code, status) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(err.http_status(), status);
        }
    }

    #[test]
    fn internal_detail_is_stripped() {
        let err = RpcError::Internal {
            message: "connection pool exhausted at worker 3".to_string(),
        };
        assert_eq!(err.client_message(), "internal error");
    }

    #[test]
    fn invalid_params_message_kept() {
        let err = RpcError::invalid_params("missing field: consentType");
        assert_eq!(err.client_message(), "missing field: consentType");
    }

    #[test]
    fn chat_validation_becomes_invalid_params() {
        let err: RpcError =
            ChatError::Validation("message must not be empty".to_string())
                .into();
        assert_matches!(err, RpcError::InvalidParams { .. });
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn chat_unauthorized_maps_through() {
        let err: RpcError = ChatError::Unauthorized.into();
        assert_matches!(err, RpcError::Unauthorized);
        assert_eq!(err.client_message(), "unauthorized");
    }
}
