//! Audit repository — append-only writes to the `audit_log` table.
//!
//! There is no update or delete here on purpose. Event payloads are stored
//! as JSON text; a payload that is not valid JSON never reaches this layer
//! because callers hand over `serde_json::Value`.

use omsorg_core::ids::{AuditEntryId, ConversationId, UserId};
use rusqlite::{Connection, params};

use crate::errors::Result;
use crate::row_types::{AuditEntryRow, NewAuditEntry, now_rfc3339};

const COLUMNS: &str = "id, user_id, conversation_id, message_id, event_type, event_data, \
                       ip_address, user_agent, created_at";

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntryRow> {
    let event_data: Option<String> = row.get(5)?;
    let event_data = event_data
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                Box::new(err),
            )
        })?;
    Ok(AuditEntryRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        conversation_id: row.get(2)?,
        message_id: row.get(3)?,
        event_type: row.get(4)?,
        event_data,
        ip_address: row.get(6)?,
        user_agent: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Audit repository — stateless, every method takes `&Connection`.
pub struct AuditRepo;

impl AuditRepo {
    /// Append one entry and return its id.
    pub fn append(conn: &Connection, entry: &NewAuditEntry<'_>) -> Result<AuditEntryId> {
        let event_data = entry.event_data.as_ref().map(serde_json::Value::to_string);
        let _ = conn.execute(
            "INSERT INTO audit_log
                 (user_id, conversation_id, message_id, event_type, event_data,
                  ip_address, user_agent, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.user_id,
                entry.conversation_id,
                entry.message_id,
                entry.event_type,
                event_data,
                entry.ip_address,
                entry.user_agent,
                now_rfc3339(),
            ],
        )?;
        Ok(AuditEntryId(conn.last_insert_rowid()))
    }

    /// All entries referencing a conversation, oldest first.
    pub fn list_for_conversation(
        conn: &Connection,
        conversation_id: ConversationId,
    ) -> Result<Vec<AuditEntryRow>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM audit_log
             WHERE conversation_id = ?1
             ORDER BY created_at ASC, id ASC"
        ))?;
        let rows = stmt
            .query_map(params![conversation_id], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All entries referencing a user, oldest first.
    pub fn list_for_user(conn: &Connection, user_id: UserId) -> Result<Vec<AuditEntryRow>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM audit_log
             WHERE user_id = ?1
             ORDER BY created_at ASC, id ASC"
        ))?;
        let rows = stmt
            .query_map(params![user_id], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_connection;
    use serde_json::json;

    #[test]
    fn append_then_list_round_trips_payload() {
        let conn = test_connection();
        let mut entry = NewAuditEntry::new("user_message");
        entry.user_id = Some(UserId(1));
        entry.conversation_id = Some(ConversationId(9));
        entry.event_data = Some(json!({ "messageLength": 42 }));
        entry.ip_address = Some("10.0.0.1");

        AuditRepo::append(&conn, &entry).unwrap();

        let rows = AuditRepo::list_for_conversation(&conn, ConversationId(9)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event_type, "user_message");
        assert_eq!(rows[0].event_data, Some(json!({ "messageLength": 42 })));
        assert_eq!(rows[0].ip_address.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn references_are_optional() {
        let conn = test_connection();
        let id = AuditRepo::append(&conn, &NewAuditEntry::new("service_started")).unwrap();
        assert!(id.as_i64() > 0);
    }

    #[test]
    fn audit_rows_do_not_require_live_referents() {
        // The table carries no foreign keys, so an entry can point at a
        // conversation id that was never created.
        let conn = test_connection();
        let mut entry = NewAuditEntry::new("ai_error");
        entry.conversation_id = Some(ConversationId(12345));
        AuditRepo::append(&conn, &entry).unwrap();
    }

    #[test]
    fn list_for_user_is_oldest_first() {
        let conn = test_connection();
        for event in ["consent_granted", "conversation_started", "user_message"] {
            let mut entry = NewAuditEntry::new(event);
            entry.user_id = Some(UserId(5));
            AuditRepo::append(&conn, &entry).unwrap();
        }

        let rows = AuditRepo::list_for_user(&conn, UserId(5)).unwrap();
        let events: Vec<_> = rows.iter().map(|r| r.event_type.as_str()).collect();
        assert_eq!(events, ["consent_granted", "conversation_started", "user_message"]);
    }
}
