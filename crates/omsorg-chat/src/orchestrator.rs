//! The conversation message pipeline.
//!
//! One call to [`ChatOrchestrator::handle_message`] runs the whole turn:
//! resolve or create the conversation, persist the patient message, assemble
//! the prompt, call the gateway, persist the assistant message, and audit
//! each milestone. Every step is independently durable; there is no
//! cross-step transaction and no retry. A gateway failure leaves the
//! patient's message persisted, audits `ai_error`, and propagates.

use std::sync::Arc;

use omsorg_core::ids::{ConversationId, MessageId, UserId};
use omsorg_core::messages::{Language, PromptMessage, Role};
use omsorg_llm::Gateway;
use omsorg_store::ChatStore;
use omsorg_store::row_types::{ConversationRow, MessageRow};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::audit::{AuditEvent, AuditRecorder, RequestMeta};
use crate::compliance::{FALLBACK_REPLY, build_system_preamble};
use crate::errors::{ChatError, ChatResult};

/// The outcome of one successful turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatReply {
    /// The conversation the turn landed in (fresh when none was supplied).
    pub conversation_id: ConversationId,
    /// Id of the persisted assistant message.
    pub message_id: MessageId,
    /// The assistant's reply text.
    pub text: String,
}

/// Orchestrates the store, the gateway, and the audit recorder.
#[derive(Clone)]
pub struct ChatOrchestrator {
    store: Arc<ChatStore>,
    gateway: Arc<dyn Gateway>,
    audit: AuditRecorder,
}

impl ChatOrchestrator {
    /// Wire up the pipeline.
    #[must_use]
    pub fn new(store: Arc<ChatStore>, gateway: Arc<dyn Gateway>, audit: AuditRecorder) -> Self {
        Self {
            store,
            gateway,
            audit,
        }
    }

    /// Run one turn for `user`.
    ///
    /// With `conversation_id` absent a new conversation is created in
    /// `language`; present, it must exist and belong to `user` or the call
    /// fails [`ChatError::Unauthorized`] before anything is written.
    ///
    /// Consent is this method's precondition, enforced one layer up.
    #[instrument(skip(self, text, meta), fields(user = %user, len = text.len()))]
    pub async fn handle_message(
        &self,
        user: UserId,
        conversation_id: Option<ConversationId>,
        text: &str,
        language: Language,
        meta: &RequestMeta,
    ) -> ChatResult<ChatReply> {
        if text.trim().is_empty() {
            return Err(ChatError::Validation("message must not be empty".into()));
        }

        let conversation = self
            .resolve_conversation(user, conversation_id, language, meta)?;
        let conversation_id = conversation.id;

        let user_message =
            self.store
                .append_message(conversation_id, Role::User, text, language)?;
        self.audit.record(
            AuditEvent::for_user("user_message", user)
                .conversation(conversation_id)
                .message(user_message.id)
                .data(json!({ "messageLength": text.len() })),
            meta,
        );

        let prompt = self.assemble_prompt(conversation_id, user_message.id, text, language)?;
        debug!(turns = prompt.len(), "prompt assembled");

        let completion = match self.gateway.complete(&prompt).await {
            Ok(completion) => completion,
            Err(err) => {
                self.audit.record(
                    AuditEvent::for_user("ai_error", user)
                        .conversation(conversation_id)
                        .data(json!({ "error": err.to_string() })),
                    meta,
                );
                return Err(err.into());
            }
        };

        let reply_text = completion
            .content
            .unwrap_or_else(|| FALLBACK_REPLY.to_string());
        let assistant_message =
            self.store
                .append_message(conversation_id, Role::Assistant, &reply_text, language)?;
        self.audit.record(
            AuditEvent::for_user("ai_response", user)
                .conversation(conversation_id)
                .message(assistant_message.id)
                .data(json!({
                    "responseLength": reply_text.len(),
                    "model": completion.model,
                })),
            meta,
        );

        info!(
            conversation = %conversation_id,
            message = %assistant_message.id,
            "turn completed"
        );
        Ok(ChatReply {
            conversation_id,
            message_id: assistant_message.id,
            text: reply_text,
        })
    }

    /// Full ordered history of one of `user`'s conversations.
    pub fn history(
        &self,
        user: UserId,
        conversation_id: ConversationId,
    ) -> ChatResult<Vec<MessageRow>> {
        let _ = self.owned_conversation(user, conversation_id)?;
        Ok(self.store.list_messages(conversation_id)?)
    }

    /// The user's conversations, most recently active first.
    pub fn list(&self, user: UserId) -> ChatResult<Vec<ConversationRow>> {
        Ok(self.store.list_conversations(user)?)
    }

    fn resolve_conversation(
        &self,
        user: UserId,
        conversation_id: Option<ConversationId>,
        language: Language,
        meta: &RequestMeta,
    ) -> ChatResult<ConversationRow> {
        match conversation_id {
            Some(id) => self.owned_conversation(user, id),
            None => {
                let conversation = self.store.create_conversation(user, language)?;
                self.audit.record(
                    AuditEvent::for_user("conversation_started", user)
                        .conversation(conversation.id)
                        .data(json!({ "language": language })),
                    meta,
                );
                Ok(conversation)
            }
        }
    }

    /// Fetch a conversation, collapsing "missing" and "someone else's" into
    /// [`ChatError::Unauthorized`].
    fn owned_conversation(
        &self,
        user: UserId,
        conversation_id: ConversationId,
    ) -> ChatResult<ConversationRow> {
        let conversation = self
            .store
            .get_conversation(conversation_id)?
            .ok_or(ChatError::Unauthorized)?;
        if conversation.user_id != user {
            return Err(ChatError::Unauthorized);
        }
        Ok(conversation)
    }

    /// System preamble, then prior user/assistant turns in order, then the
    /// current message. The just-appended row is excluded by id so the
    /// current turn appears exactly once; persisted system rows are never
    /// replayed.
    fn assemble_prompt(
        &self,
        conversation_id: ConversationId,
        current_message_id: MessageId,
        text: &str,
        language: Language,
    ) -> ChatResult<Vec<PromptMessage>> {
        let history = self.store.list_messages(conversation_id)?;

        let mut prompt = Vec::with_capacity(history.len() + 2);
        prompt.push(PromptMessage::system(build_system_preamble(language)));
        for row in &history {
            if row.id == current_message_id || row.role == Role::System {
                continue;
            }
            prompt.push(PromptMessage {
                role: row.role,
                content: row.content.clone(),
            });
        }
        prompt.push(PromptMessage::user(text));
        Ok(prompt)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use omsorg_llm::{Completion, GatewayError, GatewayResult};
    use omsorg_store::open_pool;
    use std::sync::Mutex;

    /// Scripted gateway: answers from a queue, records every prompt it saw.
    struct FakeGateway {
        replies: Mutex<Vec<GatewayResult<Completion>>>,
        prompts: Mutex<Vec<Vec<PromptMessage>>>,
    }

    impl FakeGateway {
        fn scripted(replies: Vec<GatewayResult<Completion>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn saying(text: &str) -> Arc<Self> {
            Self::scripted(vec![Ok(Completion {
                content: Some(text.to_string()),
                model: "test-model".to_string(),
            })])
        }

        fn last_prompt(&self) -> Vec<PromptMessage> {
            self.prompts.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl Gateway for FakeGateway {
        async fn complete(&self, prompt: &[PromptMessage]) -> GatewayResult<Completion> {
            self.prompts.lock().unwrap().push(prompt.to_vec());
            self.replies.lock().unwrap().remove(0)
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        store: Arc<ChatStore>,
        gateway: Arc<FakeGateway>,
        orchestrator: ChatOrchestrator,
    }

    fn harness(gateway: Arc<FakeGateway>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let pool = open_pool(dir.path().join("chat.db"), 4).unwrap();
        let store = Arc::new(ChatStore::new(pool));
        let orchestrator = ChatOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&gateway) as Arc<dyn Gateway>,
            AuditRecorder::new(Arc::clone(&store)),
        );
        Harness {
            _dir: dir,
            store,
            gateway,
            orchestrator,
        }
    }

    fn meta() -> RequestMeta {
        RequestMeta::empty()
    }

    #[tokio::test]
    async fn first_message_creates_conversation_and_two_rows() {
        let h = harness(FakeGateway::saying("Hello! How can I help?"));

        let reply = h
            .orchestrator
            .handle_message(UserId(1), None, "I have a question", Language::En, &meta())
            .await
            .unwrap();

        assert_eq!(reply.text, "Hello! How can I help?");
        let history = h.store.list_messages(reply.conversation_id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "I have a question");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].id, reply.message_id);
    }

    #[tokio::test]
    async fn continuing_a_conversation_echoes_its_id() {
        let h = harness(FakeGateway::scripted(vec![
            Ok(Completion {
                content: Some("first".into()),
                model: "m".into(),
            }),
            Ok(Completion {
                content: Some("second".into()),
                model: "m".into(),
            }),
        ]));

        let first = h
            .orchestrator
            .handle_message(UserId(1), None, "opening", Language::En, &meta())
            .await
            .unwrap();
        let second = h
            .orchestrator
            .handle_message(
                UserId(1),
                Some(first.conversation_id),
                "follow-up",
                Language::En,
                &meta(),
            )
            .await
            .unwrap();

        assert_eq!(second.conversation_id, first.conversation_id);
        assert_eq!(h.store.count_messages(first.conversation_id).unwrap(), 4);
    }

    #[tokio::test]
    async fn prompt_is_preamble_history_then_current_turn() {
        let h = harness(FakeGateway::scripted(vec![
            Ok(Completion {
                content: Some("reply one".into()),
                model: "m".into(),
            }),
            Ok(Completion {
                content: Some("reply two".into()),
                model: "m".into(),
            }),
        ]));

        let first = h
            .orchestrator
            .handle_message(UserId(1), None, "turn one", Language::Da, &meta())
            .await
            .unwrap();
        h.orchestrator
            .handle_message(
                UserId(1),
                Some(first.conversation_id),
                "turn two",
                Language::Da,
                &meta(),
            )
            .await
            .unwrap();

        let prompt = h.gateway.last_prompt();
        assert_eq!(prompt.len(), 4);
        assert_eq!(prompt[0].role, Role::System);
        assert!(prompt[0].content.contains("5. Use Danish language"));
        assert_eq!(prompt[1].content, "turn one");
        assert_eq!(prompt[2].content, "reply one");
        assert_eq!(prompt[3], PromptMessage::user("turn two"));
    }

    #[tokio::test]
    async fn empty_message_is_rejected_before_any_write() {
        let h = harness(FakeGateway::saying("unused"));

        let err = h
            .orchestrator
            .handle_message(UserId(1), None, "   ", Language::En, &meta())
            .await
            .unwrap_err();

        assert_matches!(err, ChatError::Validation(_));
        assert!(h.store.list_conversations(UserId(1)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn foreign_conversation_is_unauthorized_and_untouched() {
        let h = harness(FakeGateway::scripted(vec![
            Ok(Completion {
                content: Some("for the owner".into()),
                model: "m".into(),
            }),
        ]));

        let owned = h
            .orchestrator
            .handle_message(UserId(1), None, "mine", Language::En, &meta())
            .await
            .unwrap();
        let before = h.store.count_messages(owned.conversation_id).unwrap();

        let err = h
            .orchestrator
            .handle_message(
                UserId(2),
                Some(owned.conversation_id),
                "intruding",
                Language::En,
                &meta(),
            )
            .await
            .unwrap_err();

        assert_matches!(err, ChatError::Unauthorized);
        assert_eq!(h.store.count_messages(owned.conversation_id).unwrap(), before);
    }

    #[tokio::test]
    async fn missing_conversation_is_also_unauthorized() {
        let h = harness(FakeGateway::saying("unused"));
        let err = h
            .orchestrator
            .handle_message(
                UserId(1),
                Some(ConversationId(404)),
                "hello?",
                Language::En,
                &meta(),
            )
            .await
            .unwrap_err();
        assert_matches!(err, ChatError::Unauthorized);
    }

    #[tokio::test]
    async fn gateway_failure_keeps_user_message_and_audits_ai_error() {
        let h = harness(FakeGateway::scripted(vec![Err(GatewayError::Api {
            status: 500,
            message: "upstream exploded".into(),
        })]));

        let err = h
            .orchestrator
            .handle_message(UserId(1), None, "are you there?", Language::En, &meta())
            .await
            .unwrap_err();
        assert_matches!(err, ChatError::Generation(_));

        let conversations = h.store.list_conversations(UserId(1)).unwrap();
        assert_eq!(conversations.len(), 1);
        let conversation_id = conversations[0].id;

        // The patient turn survived; no assistant turn was written.
        let history = h.store.list_messages(conversation_id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);

        let audit = h.store.list_audit_for_conversation(conversation_id).unwrap();
        let events: Vec<_> = audit.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(events, ["conversation_started", "user_message", "ai_error"]);
        assert_eq!(
            audit[2].event_data.as_ref().unwrap()["error"],
            "API error (500): upstream exploded"
        );
    }

    #[tokio::test]
    async fn missing_content_falls_back_to_apology() {
        let h = harness(FakeGateway::scripted(vec![Ok(Completion {
            content: None,
            model: "m".into(),
        })]));

        let reply = h
            .orchestrator
            .handle_message(UserId(1), None, "hello", Language::Da, &meta())
            .await
            .unwrap();

        assert_eq!(reply.text, FALLBACK_REPLY);
        let history = h.store.list_messages(reply.conversation_id).unwrap();
        assert_eq!(history[1].content, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn audit_trail_for_a_successful_turn() {
        let h = harness(FakeGateway::saying("fine, thanks"));

        let reply = h
            .orchestrator
            .handle_message(UserId(8), None, "how are you", Language::En, &meta())
            .await
            .unwrap();

        let audit = h
            .store
            .list_audit_for_conversation(reply.conversation_id)
            .unwrap();
        let events: Vec<_> = audit.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(events, ["conversation_started", "user_message", "ai_response"]);

        assert_eq!(audit[0].event_data.as_ref().unwrap()["language"], "en");
        assert_eq!(audit[1].event_data.as_ref().unwrap()["messageLength"], 11);
        let response_payload = audit[2].event_data.as_ref().unwrap();
        assert_eq!(response_payload["responseLength"], 12);
        assert_eq!(response_payload["model"], "test-model");
        assert_eq!(audit[2].message_id, Some(reply.message_id));
    }

    #[tokio::test]
    async fn history_enforces_ownership() {
        let h = harness(FakeGateway::saying("reply"));
        let reply = h
            .orchestrator
            .handle_message(UserId(1), None, "mine", Language::En, &meta())
            .await
            .unwrap();

        let rows = h.orchestrator.history(UserId(1), reply.conversation_id).unwrap();
        assert_eq!(rows.len(), 2);

        let err = h
            .orchestrator
            .history(UserId(2), reply.conversation_id)
            .unwrap_err();
        assert_matches!(err, ChatError::Unauthorized);
    }

    #[tokio::test]
    async fn list_returns_most_recently_active_first() {
        let h = harness(FakeGateway::scripted(vec![
            Ok(Completion {
                content: Some("a".into()),
                model: "m".into(),
            }),
            Ok(Completion {
                content: Some("b".into()),
                model: "m".into(),
            }),
            Ok(Completion {
                content: Some("c".into()),
                model: "m".into(),
            }),
        ]));

        let first = h
            .orchestrator
            .handle_message(UserId(1), None, "older", Language::En, &meta())
            .await
            .unwrap();
        let second = h
            .orchestrator
            .handle_message(UserId(1), None, "newer", Language::En, &meta())
            .await
            .unwrap();

        // A new turn in the first conversation bumps it back to the front.
        h.orchestrator
            .handle_message(
                UserId(1),
                Some(first.conversation_id),
                "again",
                Language::En,
                &meta(),
            )
            .await
            .unwrap();

        let listed = h.orchestrator.list(UserId(1)).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.conversation_id);
        assert_eq!(listed[1].id, second.conversation_id);
    }
}
