//! `escalation.*` handlers.

use async_trait::async_trait;
use omsorg_chat::RequestMeta;
use omsorg_core::ids::{ConversationId, EscalationId, MessageId, UserId};
use omsorg_store::row_types::{EscalationStatus, EscalationUpdate};
use serde_json::{Value, json};
use tracing::instrument;

use crate::rpc::context::RpcContext;
use crate::rpc::errors::{ESCALATION_NOT_FOUND, RpcError};
use crate::rpc::handlers::{
    optional_i64_param, optional_string_param, require_i64_param,
    require_string_param,
};
use crate::rpc::registry::MethodHandler;

/// `escalation.request` — flag a conversation for human review.
///
/// Params: `conversationId` (integer), `messageId` (integer, optional),
/// `reason` (non-empty string).
pub struct RequestHandler;

#[async_trait]
impl MethodHandler for RequestHandler {
    #[instrument(skip_all, fields(method = "escalation.request", user = user.as_i64()))]
    async fn handle(
        &self,
        params: Option<Value>,
        user: UserId,
        meta: &RequestMeta,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        let conversation_id =
            ConversationId(require_i64_param(&params, "conversationId")?);
        let message_id = optional_i64_param(&params, "messageId")?.map(MessageId);
        let reason = require_string_param(&params, "reason")?;

        let escalation_id = ctx
            .escalation
            .request(user, conversation_id, message_id, &reason, meta)?;
        Ok(json!({ "success": true, "escalationId": escalation_id }))
    }
}

/// `escalation.update` — move an escalation through its lifecycle.
///
/// Params: `escalationId` (integer), `status` (`pending`, `assigned` or
/// `resolved`), `assignedTo` (string, optional), `resolution` (string,
/// optional).
pub struct UpdateHandler;

#[async_trait]
impl MethodHandler for UpdateHandler {
    #[instrument(skip_all, fields(method = "escalation.update", user = user.as_i64()))]
    async fn handle(
        &self,
        params: Option<Value>,
        user: UserId,
        meta: &RequestMeta,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        let escalation_id = EscalationId(require_i64_param(&params, "escalationId")?);
        let status_tag = require_string_param(&params, "status")?;
        let status = EscalationStatus::from_tag(&status_tag).ok_or_else(|| {
            RpcError::invalid_params(format!("unknown status: {status_tag}"))
        })?;
        let update = EscalationUpdate {
            status,
            assigned_to: optional_string_param(&params, "assignedTo")?,
            resolution: optional_string_param(&params, "resolution")?,
        };

        if ctx.escalation.update_status(escalation_id, &update, meta)? {
            Ok(json!({ "success": true }))
        } else {
            Err(RpcError::NotFound {
                code: ESCALATION_NOT_FOUND,
                message: format!("unknown escalation: {escalation_id}"),
            })
        }
    }
}

/// `escalation.listPending` — the review queue, oldest first.
pub struct ListPendingHandler;

#[async_trait]
impl MethodHandler for ListPendingHandler {
    #[instrument(skip_all, fields(method = "escalation.listPending", user = user.as_i64()))]
    async fn handle(
        &self,
        _params: Option<Value>,
        user: UserId,
        _meta: &RequestMeta,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        let escalations = ctx.escalation.list_pending()?;
        Ok(json!({ "escalations": escalations }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
