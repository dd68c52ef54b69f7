//! Method handlers, grouped by namespace.
//!
//! - `chat.*` — send a message, read history, list conversations
//! - `consent.*` — grant, check, revoke
//! - `escalation.*` — request, update, list pending

pub mod chat;
pub mod consent;
pub mod escalation;

use std::sync::Arc;

use serde_json::Value;

use crate::rpc::errors::RpcError;
use crate::rpc::registry::MethodRegistry;

/// Register every method on the registry.
pub fn register_all(registry: &mut MethodRegistry) {
    registry.register("chat.send", Arc::new(chat::SendHandler));
    registry.register("chat.history", Arc::new(chat::HistoryHandler));
    registry.register("chat.list", Arc::new(chat::ListHandler));
    registry.register("consent.grant", Arc::new(consent::GrantHandler));
    registry.register("consent.check", Arc::new(consent::CheckHandler));
    registry.register("consent.revoke", Arc::new(consent::RevokeHandler));
    registry.register("escalation.request", Arc::new(escalation::RequestHandler));
    registry.register("escalation.update", Arc::new(escalation::UpdateHandler));
    registry.register(
        "escalation.listPending",
        Arc::new(escalation::ListPendingHandler),
    );
}

// ── Param extraction ────────────────────────────────────────────────────────

/// Get a named field from the params object, or fail with `invalid_params`.
pub fn require_param<'a>(
    params: &'a Option<Value>,
    name: &str,
) -> Result<&'a Value, RpcError> {
    params
        .as_ref()
        .and_then(|p| p.get(name))
        .filter(|v| !v.is_null())
        .ok_or_else(|| RpcError::invalid_params(format!("missing field: {name}")))
}

/// Get a required string field, rejecting non-strings.
pub fn require_string_param(
    params: &Option<Value>,
    name: &str,
) -> Result<String, RpcError> {
    require_param(params, name)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| RpcError::invalid_params(format!("field must be a string: {name}")))
}

/// Get a required integer field, rejecting non-integers.
pub fn require_i64_param(params: &Option<Value>, name: &str) -> Result<i64, RpcError> {
    require_param(params, name)?
        .as_i64()
        .ok_or_else(|| RpcError::invalid_params(format!("field must be an integer: {name}")))
}

/// Get an optional string field. Absent or null is `None`; a present
/// non-string is an error.
pub fn optional_string_param(
    params: &Option<Value>,
    name: &str,
) -> Result<Option<String>, RpcError> {
    match params.as_ref().and_then(|p| p.get(name)) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_str().map(str::to_string).map(Some).ok_or_else(|| {
            RpcError::invalid_params(format!("field must be a string: {name}"))
        }),
    }
}

/// Get an optional integer field. Absent or null is `None`; a present
/// non-integer is an error.
pub fn optional_i64_param(
    params: &Option<Value>,
    name: &str,
) -> Result<Option<i64>, RpcError> {
    match params.as_ref().and_then(|p| p.get(name)) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| {
            RpcError::invalid_params(format!("field must be an integer: {name}"))
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Test helpers
// ─────────────────────────────────────────────────────────────────────────────


// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
