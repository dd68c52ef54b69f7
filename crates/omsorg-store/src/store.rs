//! High-level store over the connection pool.
//!
//! [`ChatStore`] is the only storage surface the orchestrator and the RPC
//! handlers see. Each method checks out one pooled connection, delegates to
//! the repositories, and returns. [`ChatStore::append_message`] is the one
//! multi-statement write and runs in its own transaction.

use omsorg_core::ids::{ConversationId, EscalationId, MessageId, UserId};
use omsorg_core::messages::{Language, Role};
use tracing::{debug, instrument};

use crate::connection::ConnectionPool;
use crate::errors::Result;
use crate::repositories::{AuditRepo, ConsentRepo, ConversationRepo, EscalationRepo, MessageRepo};
use crate::row_types::{
    AuditEntryRow, ConsentRow, ConversationRow, EscalationRow, EscalationUpdate, MessageRow,
    NewAuditEntry,
};

/// Thread-safe handle over the SQLite pool. Cheap to clone.
#[derive(Clone)]
pub struct ChatStore {
    pool: ConnectionPool,
}

impl ChatStore {
    /// Wrap an opened pool.
    #[must_use]
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    // ── conversations ───────────────────────────────────────────────────────

    /// Create a conversation for `user_id`.
    #[instrument(skip(self))]
    pub fn create_conversation(
        &self,
        user_id: UserId,
        language: Language,
    ) -> Result<ConversationRow> {
        let conn = self.pool.get()?;
        let row = ConversationRepo::create(&conn, user_id, language)?;
        debug!(conversation_id = %row.id, "conversation created");
        Ok(row)
    }

    /// Fetch a conversation by id.
    pub fn get_conversation(&self, id: ConversationId) -> Result<Option<ConversationRow>> {
        let conn = self.pool.get()?;
        ConversationRepo::get_by_id(&conn, id)
    }

    /// A user's conversations, most recently active first.
    pub fn list_conversations(&self, user_id: UserId) -> Result<Vec<ConversationRow>> {
        let conn = self.pool.get()?;
        ConversationRepo::list_for_user(&conn, user_id)
    }

    // ── messages ────────────────────────────────────────────────────────────

    /// Append a turn and bump the conversation's `updated_at`, atomically.
    #[instrument(skip(self, content), fields(len = content.len()))]
    pub fn append_message(
        &self,
        conversation_id: ConversationId,
        role: Role,
        content: &str,
        language: Language,
    ) -> Result<MessageRow> {
        let conn = self.pool.get()?;
        let tx = conn.unchecked_transaction()?;
        let row = MessageRepo::append(&tx, conversation_id, role, content, language)?;
        ConversationRepo::touch(&tx, conversation_id)?;
        tx.commit()?;
        debug!(message_id = %row.id, %role, "message appended");
        Ok(row)
    }

    /// All turns of a conversation in insertion order.
    pub fn list_messages(&self, conversation_id: ConversationId) -> Result<Vec<MessageRow>> {
        let conn = self.pool.get()?;
        MessageRepo::list_for_conversation(&conn, conversation_id)
    }

    /// Number of turns in a conversation.
    pub fn count_messages(&self, conversation_id: ConversationId) -> Result<u64> {
        let conn = self.pool.get()?;
        MessageRepo::count_for_conversation(&conn, conversation_id)
    }

    // ── consent ─────────────────────────────────────────────────────────────

    /// Record a new consent grant.
    #[instrument(skip(self, consent_text, ip_address))]
    pub fn insert_consent(
        &self,
        user_id: UserId,
        consent_type: &str,
        consent_text: &str,
        ip_address: Option<&str>,
    ) -> Result<ConsentRow> {
        let conn = self.pool.get()?;
        let row = ConsentRepo::insert(&conn, user_id, consent_type, consent_text, ip_address)?;
        debug!(consent_id = %row.id, "consent granted");
        Ok(row)
    }

    /// The newest consent row for a (user, type) pair.
    pub fn latest_consent(
        &self,
        user_id: UserId,
        consent_type: &str,
    ) -> Result<Option<ConsentRow>> {
        let conn = self.pool.get()?;
        ConsentRepo::latest(&conn, user_id, consent_type)
    }

    /// Revoke all live grants of a (user, type) pair; returns how many
    /// rows were revoked.
    #[instrument(skip(self))]
    pub fn revoke_consent(&self, user_id: UserId, consent_type: &str) -> Result<usize> {
        let conn = self.pool.get()?;
        let revoked = ConsentRepo::revoke(&conn, user_id, consent_type)?;
        debug!(revoked, "consent revoked");
        Ok(revoked)
    }

    // ── escalations ─────────────────────────────────────────────────────────

    /// File a new pending escalation.
    #[instrument(skip(self, reason))]
    pub fn insert_escalation(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
        message_id: Option<MessageId>,
        reason: &str,
    ) -> Result<EscalationRow> {
        let conn = self.pool.get()?;
        let row = EscalationRepo::insert(&conn, user_id, conversation_id, message_id, reason)?;
        debug!(escalation_id = %row.id, "escalation filed");
        Ok(row)
    }

    /// Fetch an escalation by id.
    pub fn get_escalation(&self, id: EscalationId) -> Result<Option<EscalationRow>> {
        let conn = self.pool.get()?;
        EscalationRepo::get_by_id(&conn, id)
    }

    /// Apply a status update; `None` when the id does not exist.
    #[instrument(skip(self, update), fields(status = %update.status))]
    pub fn update_escalation(
        &self,
        id: EscalationId,
        update: &EscalationUpdate,
    ) -> Result<Option<EscalationRow>> {
        let conn = self.pool.get()?;
        EscalationRepo::update(&conn, id, update)
    }

    /// Pending escalations, oldest first.
    pub fn list_pending_escalations(&self) -> Result<Vec<EscalationRow>> {
        let conn = self.pool.get()?;
        EscalationRepo::list_pending(&conn)
    }

    // ── audit ───────────────────────────────────────────────────────────────

    /// Append one audit entry.
    pub fn append_audit(&self, entry: &NewAuditEntry<'_>) -> Result<()> {
        let conn = self.pool.get()?;
        let _ = AuditRepo::append(&conn, entry)?;
        Ok(())
    }

    /// Audit entries for a conversation, oldest first.
    pub fn list_audit_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<AuditEntryRow>> {
        let conn = self.pool.get()?;
        AuditRepo::list_for_conversation(&conn, conversation_id)
    }

    /// Audit entries for a user, oldest first.
    pub fn list_audit_for_user(&self, user_id: UserId) -> Result<Vec<AuditEntryRow>> {
        let conn = self.pool.get()?;
        AuditRepo::list_for_user(&conn, user_id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
