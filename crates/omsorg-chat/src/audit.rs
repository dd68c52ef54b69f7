//! Best-effort audit recording.
//!
//! Every boundary operation audits its milestones, but a failed audit write
//! must never change the operation's outcome. [`AuditRecorder::record`]
//! therefore logs the failure and returns; the primary write path never
//! sees it.

use std::sync::Arc;

use omsorg_core::ids::{ConversationId, MessageId, UserId};
use omsorg_store::ChatStore;
use omsorg_store::row_types::NewAuditEntry;
use serde_json::Value;
use tracing::warn;

/// Request metadata captured at the HTTP boundary and threaded through the
/// services for audit purposes.
#[derive(Clone, Debug, Default)]
pub struct RequestMeta {
    /// Client address, `x-forwarded-for` when proxied, `"unknown"` when
    /// neither is available.
    pub ip_address: Option<String>,
    /// The client's `User-Agent` header.
    pub user_agent: Option<String>,
}

impl RequestMeta {
    /// Metadata with neither field set, for internal callers and tests.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// One audit event about to be recorded.
#[derive(Clone, Debug)]
pub struct AuditEvent<'a> {
    pub user_id: Option<UserId>,
    pub conversation_id: Option<ConversationId>,
    pub message_id: Option<MessageId>,
    pub event_type: &'a str,
    pub event_data: Option<Value>,
}

impl<'a> AuditEvent<'a> {
    /// An event of `event_type` attributed to `user_id`.
    #[must_use]
    pub fn for_user(event_type: &'a str, user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            conversation_id: None,
            message_id: None,
            event_type,
            event_data: None,
        }
    }

    /// Attach a conversation reference.
    #[must_use]
    pub fn conversation(mut self, id: ConversationId) -> Self {
        self.conversation_id = Some(id);
        self
    }

    /// Attach a message reference.
    #[must_use]
    pub fn message(mut self, id: MessageId) -> Self {
        self.message_id = Some(id);
        self
    }

    /// Attach a JSON payload.
    #[must_use]
    pub fn data(mut self, data: Value) -> Self {
        self.event_data = Some(data);
        self
    }
}

/// Append-only recorder over the store's audit table.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<ChatStore>,
}

impl AuditRecorder {
    /// Wrap a store handle.
    #[must_use]
    pub fn new(store: Arc<ChatStore>) -> Self {
        Self { store }
    }

    /// Record one event. A storage failure is logged and swallowed.
    pub fn record(&self, event: AuditEvent<'_>, meta: &RequestMeta) {
        let entry = NewAuditEntry {
            user_id: event.user_id,
            conversation_id: event.conversation_id,
            message_id: event.message_id,
            event_type: event.event_type,
            event_data: event.event_data,
            ip_address: meta.ip_address.as_deref(),
            user_agent: meta.user_agent.as_deref(),
        };
        if let Err(err) = self.store.append_audit(&entry) {
            warn!(event_type = event.event_type, error = %err, "audit write failed");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
