//! Flat row structs mirroring the SQLite schema.
//!
//! Timestamps are RFC 3339 strings throughout; SQLite stores them as TEXT
//! and lexicographic order matches chronological order, so `ORDER BY
//! created_at` needs no parsing.

use omsorg_core::ids::{AuditEntryId, ConsentId, ConversationId, EscalationId, MessageId, UserId};
use omsorg_core::messages::{Language, Role};
use serde::{Deserialize, Serialize};

/// Current UTC time as an RFC 3339 string, the format every row stores.
#[must_use]
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// One conversation, owned by exactly one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRow {
    pub id: ConversationId,
    pub user_id: UserId,
    pub language: Language,
    pub consent_given: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// One persisted conversation turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRow {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: Role,
    pub content: String,
    pub language: Language,
    pub created_at: String,
}

/// One row of consent history. Grants are never updated in place; a revoke
/// flips `granted` and stamps `revoked_at` on the live grant rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRow {
    pub id: ConsentId,
    pub user_id: UserId,
    pub consent_type: String,
    pub granted: bool,
    pub consent_text: String,
    pub ip_address: Option<String>,
    pub created_at: String,
    pub revoked_at: Option<String>,
}

/// Lifecycle state of a human-review request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationStatus {
    #[default]
    Pending,
    Assigned,
    Resolved,
}

impl EscalationStatus {
    /// Stable storage tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::Resolved => "resolved",
        }
    }

    /// Parse a storage tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "pending" => Some(Self::Pending),
            "assigned" => Some(Self::Assigned),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }
}

impl std::fmt::Display for EscalationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl rusqlite::types::ToSql for EscalationStatus {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl rusqlite::types::FromSql for EscalationStatus {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let tag = value.as_str()?;
        Self::from_tag(tag).ok_or(rusqlite::types::FromSqlError::InvalidType)
    }
}

/// One human-review request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationRow {
    pub id: EscalationId,
    pub user_id: UserId,
    pub conversation_id: ConversationId,
    pub message_id: Option<MessageId>,
    pub reason: String,
    pub status: EscalationStatus,
    pub assigned_to: Option<String>,
    pub resolution: Option<String>,
    pub created_at: String,
    pub resolved_at: Option<String>,
}

/// Fields applied by an escalation status update. `None` leaves the stored
/// value untouched.
#[derive(Clone, Debug, Default)]
pub struct EscalationUpdate {
    pub status: EscalationStatus,
    pub assigned_to: Option<String>,
    pub resolution: Option<String>,
}

/// One append-only audit log entry as read back from storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntryRow {
    pub id: AuditEntryId,
    pub user_id: Option<UserId>,
    pub conversation_id: Option<ConversationId>,
    pub message_id: Option<MessageId>,
    pub event_type: String,
    pub event_data: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
}

/// An audit entry about to be appended.
#[derive(Clone, Debug)]
pub struct NewAuditEntry<'a> {
    pub user_id: Option<UserId>,
    pub conversation_id: Option<ConversationId>,
    pub message_id: Option<MessageId>,
    pub event_type: &'a str,
    pub event_data: Option<serde_json::Value>,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

impl<'a> NewAuditEntry<'a> {
    /// A bare entry with just an event type; callers fill in the references
    /// they have.
    #[must_use]
    pub fn new(event_type: &'a str) -> Self {
        Self {
            user_id: None,
            conversation_id: None,
            message_id: None,
            event_type,
            event_data: None,
            ip_address: None,
            user_agent: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
