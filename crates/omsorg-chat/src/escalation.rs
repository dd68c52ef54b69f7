//! Human-review escalations.
//!
//! Patients file requests; staff move them through `pending`, `assigned`,
//! `resolved`. Transitions are deliberately unconstrained so staff tooling
//! can reopen or reassign without fighting the service layer.

use std::sync::Arc;

use omsorg_core::ids::{ConversationId, EscalationId, MessageId, UserId};
use omsorg_store::ChatStore;
use omsorg_store::row_types::{EscalationRow, EscalationUpdate};
use serde_json::json;
use tracing::instrument;

use crate::audit::{AuditEvent, AuditRecorder, RequestMeta};
use crate::errors::{ChatError, ChatResult};

/// File and track human-review requests.
#[derive(Clone)]
pub struct EscalationService {
    store: Arc<ChatStore>,
    audit: AuditRecorder,
}

impl EscalationService {
    /// Wire up the service.
    #[must_use]
    pub fn new(store: Arc<ChatStore>, audit: AuditRecorder) -> Self {
        Self { store, audit }
    }

    /// File a new pending escalation. The reason must be non-empty; nothing
    /// is persisted or audited when it isn't.
    #[instrument(skip(self, reason, meta))]
    pub fn request(
        &self,
        user: UserId,
        conversation_id: ConversationId,
        message_id: Option<MessageId>,
        reason: &str,
        meta: &RequestMeta,
    ) -> ChatResult<EscalationId> {
        if reason.trim().is_empty() {
            return Err(ChatError::Validation("escalation reason must not be empty".into()));
        }

        let row = self
            .store
            .insert_escalation(user, conversation_id, message_id, reason)?;
        self.audit.record(
            AuditEvent::for_user("escalation_requested", user)
                .conversation(conversation_id)
                .data(json!({ "escalationId": row.id, "reason": reason })),
            meta,
        );
        Ok(row.id)
    }

    /// Apply a status update. Returns `false` for an unknown id.
    #[instrument(skip(self, update, meta))]
    pub fn update_status(
        &self,
        id: EscalationId,
        update: &EscalationUpdate,
        meta: &RequestMeta,
    ) -> ChatResult<bool> {
        let Some(row) = self.store.update_escalation(id, update)? else {
            return Ok(false);
        };
        self.audit.record(
            AuditEvent::for_user("escalation_updated", row.user_id)
                .conversation(row.conversation_id)
                .data(json!({ "escalationId": id, "status": row.status })),
            meta,
        );
        Ok(true)
    }

    /// The review queue: pending escalations, oldest first.
    pub fn list_pending(&self) -> ChatResult<Vec<EscalationRow>> {
        Ok(self.store.list_pending_escalations()?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
