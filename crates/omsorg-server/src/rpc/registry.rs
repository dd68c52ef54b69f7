//! Method registry and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use omsorg_chat::RequestMeta;
use omsorg_core::ids::UserId;
use serde_json::Value;
use tracing::warn;

use crate::metrics::{RPC_ERRORS_TOTAL, RPC_REQUESTS_TOTAL};
use crate::rpc::context::RpcContext;
use crate::rpc::errors::{METHOD_NOT_FOUND, RpcError};

/// A single RPC method.
///
/// The caller's identity and request metadata are extracted from transport
/// headers before dispatch and passed in here; params never carry identity.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Execute the method and produce the result value.
    async fn handle(
        &self,
        params: Option<Value>,
        user: UserId,
        meta: &RequestMeta,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError>;
}

/// Maps method names to handlers.
pub struct MethodRegistry {
    handlers: HashMap<&'static str, Arc<dyn MethodHandler>>,
}

impl MethodRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under a method name. Replaces any existing
    /// registration for the same name.
    pub fn register(&mut self, method: &'static str, handler: Arc<dyn MethodHandler>) {
        let _ = self.handlers.insert(method, handler);
    }

    /// Whether a method name is registered.
    pub fn has_method(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Sorted list of registered method names.
    pub fn methods(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Look up and run the handler for `method`.
    ///
    /// Every dispatch increments the request counter; failures also increment
    /// the error counter labeled with the wire code, and the full error is
    /// logged here before the sanitized version goes to the client.
    pub async fn dispatch(
        &self,
        method: &str,
        params: Option<Value>,
        user: UserId,
        meta: &RequestMeta,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        counter!(RPC_REQUESTS_TOTAL, "method" => method.to_string()).increment(1);

        let Some(handler) = self.handlers.get(method) else {
            counter!(
                RPC_ERRORS_TOTAL,
                "method" => method.to_string(),
                "code" => METHOD_NOT_FOUND,
            )
            .increment(1);
            return Err(RpcError::NotFound {
                code: METHOD_NOT_FOUND,
                message: format!("unknown method: {method}"),
            });
        };

        let result = handler.handle(params, user, meta, ctx).await;
        if let Err(err) = &result {
            warn!(method, code = err.code(), error = %err, "rpc method failed");
            counter!(
                RPC_ERRORS_TOTAL,
                "method" => method.to_string(),
                "code" => err.code(),
            )
            .increment(1);
        }
        result
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
