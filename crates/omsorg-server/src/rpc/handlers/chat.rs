//! `chat.*` handlers.

use async_trait::async_trait;
use metrics::counter;
use omsorg_chat::{ChatError, DATA_PROCESSING_CONSENT, RequestMeta};
use omsorg_core::ids::{ConversationId, UserId};
use omsorg_core::messages::Language;
use serde_json::{Value, json};
use tracing::instrument;

use crate::metrics::{CHAT_GENERATION_FAILURES_TOTAL, CHAT_SENDS_TOTAL};
use crate::rpc::context::RpcContext;
use crate::rpc::errors::RpcError;
use crate::rpc::handlers::{
    optional_i64_param, optional_string_param, require_i64_param,
    require_string_param,
};
use crate::rpc::registry::MethodHandler;

/// `chat.send` — run one patient message through the pipeline.
///
/// Params: `message` (string), `conversationId` (integer, optional; omitted
/// starts a new conversation), `language` (`"en"` or `"da"`, optional,
/// defaults to `en`).
///
/// Refuses with `consent_required` unless the caller has an active data
/// processing consent. The check happens before anything is persisted.
pub struct SendHandler;

#[async_trait]
impl MethodHandler for SendHandler {
    #[instrument(skip_all, fields(method = "chat.send", user = user.as_i64()))]
    async fn handle(
        &self,
        params: Option<Value>,
        user: UserId,
        meta: &RequestMeta,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        let message = require_string_param(&params, "message")?;
        let conversation_id =
            optional_i64_param(&params, "conversationId")?.map(ConversationId);
        let language = match optional_string_param(&params, "language")? {
            Some(tag) => Language::from_tag(&tag).ok_or_else(|| {
                RpcError::invalid_params(format!("unsupported language: {tag}"))
            })?,
            None => Language::default(),
        };

        if !ctx.consent.check(user, DATA_PROCESSING_CONSENT)? {
            return Err(RpcError::ConsentRequired);
        }

        counter!(CHAT_SENDS_TOTAL).increment(1);
        let reply = ctx
            .orchestrator
            .handle_message(user, conversation_id, &message, language, meta)
            .await
            .map_err(|err| {
                if matches!(err, ChatError::Generation(_)) {
                    counter!(CHAT_GENERATION_FAILURES_TOTAL).increment(1);
                }
                RpcError::from(err)
            })?;

        Ok(json!({
            "conversationId": reply.conversation_id,
            "messageId": reply.message_id,
            "message": reply.text,
            "role": "assistant",
        }))
    }
}

/// `chat.history` — the full message list of one owned conversation.
///
/// Params: `conversationId` (integer).
pub struct HistoryHandler;

#[async_trait]
impl MethodHandler for HistoryHandler {
    #[instrument(skip_all, fields(method = "chat.history", user = user.as_i64()))]
    async fn handle(
        &self,
        params: Option<Value>,
        user: UserId,
        _meta: &RequestMeta,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        let conversation_id = ConversationId(require_i64_param(&params, "conversationId")?);
        let messages = ctx.orchestrator.history(user, conversation_id)?;
        Ok(json!({ "messages": messages }))
    }
}

/// `chat.list` — the caller's conversations, most recently updated first.
pub struct ListHandler;

#[async_trait]
impl MethodHandler for ListHandler {
    #[instrument(skip_all, fields(method = "chat.list", user = user.as_i64()))]
    async fn handle(
        &self,
        _params: Option<Value>,
        user: UserId,
        _meta: &RequestMeta,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        let conversations = ctx.orchestrator.list(user)?;
        Ok(json!({ "conversations": conversations }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::rpc::handlers::test_helpers::{
        FailingGateway, make_test_context, make_test_context_with_gateway,
    };
    use assert_matches::assert_matches;

    fn grant_consent(ctx: &RpcContext, user: UserId) {
        let _ = ctx
            .consent
            .grant(
                user,
                DATA_PROCESSING_CONSENT,
                "I agree to data processing.",
                &RequestMeta::empty(),
            )
            .unwrap();
    }

    #[tokio::test]
    async fn send_without_consent_refused() {
        let (ctx, _dir) = make_test_context();
        let err = SendHandler
            .handle(
                Some(json!({"message": "hello"})),
                UserId(1),
                &RequestMeta::empty(),
                &ctx,
            )
            .await
            .unwrap_err();
        assert_matches!(err, RpcError::ConsentRequired);
    }

    #[tokio::test]
    async fn send_creates_conversation_and_replies() {
        let (ctx, _dir) = make_test_context();
        let user = UserId(1);
        grant_consent(&ctx, user);

        let result = SendHandler
            .handle(
                Some(json!({"message": "I'm worried about my scan results"})),
                user,
                &RequestMeta::empty(),
                &ctx,
            )
            .await
            .unwrap();

        assert!(result["conversationId"].as_i64().is_some());
        assert!(result["messageId"].as_i64().is_some());
        assert_eq!(result["role"], "assistant");
        assert!(!result["message"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn send_continues_existing_conversation() {
        let (ctx, _dir) = make_test_context();
        let user = UserId(1);
        grant_consent(&ctx, user);

        let first = SendHandler
            .handle(
                Some(json!({"message": "first"})),
                user,
                &RequestMeta::empty(),
                &ctx,
            )
            .await
            .unwrap();
        let conv = first["conversationId"].as_i64().unwrap();

        let second = SendHandler
            .handle(
                Some(json!({"message": "second", "conversationId": conv})),
                user,
                &RequestMeta::empty(),
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(second["conversationId"].as_i64().unwrap(), conv);
    }

    #[tokio::test]
    async fn send_rejects_bad_language() {
        let (ctx, _dir) = make_test_context();
        let err = SendHandler
            .handle(
                Some(json!({"message": "hej", "language": "sv"})),
                UserId(1),
                &RequestMeta::empty(),
                &ctx,
            )
            .await
            .unwrap_err();
        assert_matches!(err, RpcError::InvalidParams { .. });
    }

    #[tokio::test]
    async fn send_missing_message_rejected() {
        let (ctx, _dir) = make_test_context();
        let err = SendHandler
            .handle(Some(json!({})), UserId(1), &RequestMeta::empty(), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.client_message(), "missing field: message");
    }

    #[tokio::test]
    async fn send_surfaces_generation_failure() {
        let (ctx, _dir) = make_test_context_with_gateway(Arc::new(FailingGateway));
        let user = UserId(1);
        grant_consent(&ctx, user);

        let err = SendHandler
            .handle(
                Some(json!({"message": "hello"})),
                user,
                &RequestMeta::empty(),
                &ctx,
            )
            .await
            .unwrap_err();
        assert_matches!(err, RpcError::Generation(_));
        assert_eq!(err.client_message(), "failed to generate a response");
    }

    #[tokio::test]
    async fn history_returns_both_turns() {
        let (ctx, _dir) = make_test_context();
        let user = UserId(1);
        grant_consent(&ctx, user);

        let sent = SendHandler
            .handle(
                Some(json!({"message": "hello"})),
                user,
                &RequestMeta::empty(),
                &ctx,
            )
            .await
            .unwrap();
        let conv = sent["conversationId"].as_i64().unwrap();

        let result = HistoryHandler
            .handle(
                Some(json!({"conversationId": conv})),
                user,
                &RequestMeta::empty(),
                &ctx,
            )
            .await
            .unwrap();
        let messages = result["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[1]["role"], "assistant");
    }

    #[tokio::test]
    async fn history_of_foreign_conversation_unauthorized() {
        let (ctx, _dir) = make_test_context();
        let owner = UserId(1);
        grant_consent(&ctx, owner);

        let sent = SendHandler
            .handle(
                Some(json!({"message": "hello"})),
                owner,
                &RequestMeta::empty(),
                &ctx,
            )
            .await
            .unwrap();
        let conv = sent["conversationId"].as_i64().unwrap();

        let err = HistoryHandler
            .handle(
                Some(json!({"conversationId": conv})),
                UserId(2),
                &RequestMeta::empty(),
                &ctx,
            )
            .await
            .unwrap_err();
        assert_matches!(err, RpcError::Unauthorized);
    }

    #[tokio::test]
    async fn list_empty_then_populated() {
        let (ctx, _dir) = make_test_context();
        let user = UserId(1);

        let empty = ListHandler
            .handle(None, user, &RequestMeta::empty(), &ctx)
            .await
            .unwrap();
        assert_eq!(empty["conversations"].as_array().unwrap().len(), 0);

        grant_consent(&ctx, user);
        let _ = SendHandler
            .handle(
                Some(json!({"message": "hello"})),
                user,
                &RequestMeta::empty(),
                &ctx,
            )
            .await
            .unwrap();

        let listed = ListHandler
            .handle(None, user, &RequestMeta::empty(), &ctx)
            .await
            .unwrap();
        assert_eq!(listed["conversations"].as_array().unwrap().len(), 1);
    }
}
