//! Message repository — append and replay for the `messages` table.

use omsorg_core::ids::{ConversationId, MessageId};
use omsorg_core::messages::{Language, Role};
use rusqlite::{Connection, params};

use crate::errors::Result;
use crate::row_types::{MessageRow, now_rfc3339};

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        role: row.get(2)?,
        content: row.get(3)?,
        language: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Message repository — stateless, every method takes `&Connection`.
pub struct MessageRepo;

impl MessageRepo {
    /// Append a turn to a conversation.
    pub fn append(
        conn: &Connection,
        conversation_id: ConversationId,
        role: Role,
        content: &str,
        language: Language,
    ) -> Result<MessageRow> {
        let now = now_rfc3339();
        let _ = conn.execute(
            "INSERT INTO messages (conversation_id, role, content, language, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![conversation_id, role, content, language, now],
        )?;
        Ok(MessageRow {
            id: MessageId(conn.last_insert_rowid()),
            conversation_id,
            role,
            content: content.to_string(),
            language,
            created_at: now,
        })
    }

    /// All turns of a conversation in insertion order.
    pub fn list_for_conversation(
        conn: &Connection,
        conversation_id: ConversationId,
    ) -> Result<Vec<MessageRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, conversation_id, role, content, language, created_at
             FROM messages
             WHERE conversation_id = ?1
             ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt
            .query_map(params![conversation_id], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Number of turns in a conversation.
    pub fn count_for_conversation(
        conn: &Connection,
        conversation_id: ConversationId,
    ) -> Result<u64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1",
            params![conversation_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
