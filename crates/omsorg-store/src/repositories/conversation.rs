//! Conversation repository — CRUD for the `conversations` table.

use omsorg_core::ids::{ConversationId, UserId};
use omsorg_core::messages::Language;
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;
use crate::row_types::{ConversationRow, now_rfc3339};

const COLUMNS: &str = "id, user_id, language, consent_given, created_at, updated_at";

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConversationRow> {
    Ok(ConversationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        language: row.get(2)?,
        consent_given: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Conversation repository — stateless, every method takes `&Connection`.
pub struct ConversationRepo;

impl ConversationRepo {
    /// Create a conversation for `user_id` in `language`.
    ///
    /// `consent_given` is stamped true: the orchestrator only creates a
    /// conversation after the consent gate has passed.
    pub fn create(
        conn: &Connection,
        user_id: UserId,
        language: Language,
    ) -> Result<ConversationRow> {
        let now = now_rfc3339();
        let _ = conn.execute(
            "INSERT INTO conversations (user_id, language, consent_given, created_at, updated_at)
             VALUES (?1, ?2, 1, ?3, ?3)",
            params![user_id, language, now],
        )?;
        Ok(ConversationRow {
            id: ConversationId(conn.last_insert_rowid()),
            user_id,
            language,
            consent_given: true,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a conversation by id.
    pub fn get_by_id(conn: &Connection, id: ConversationId) -> Result<Option<ConversationRow>> {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM conversations WHERE id = ?1"),
                params![id],
                map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// List a user's conversations, most recently active first.
    pub fn list_for_user(conn: &Connection, user_id: UserId) -> Result<Vec<ConversationRow>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM conversations
             WHERE user_id = ?1
             ORDER BY updated_at DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map(params![user_id], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Bump `updated_at` so the conversation sorts to the top of the list.
    pub fn touch(conn: &Connection, id: ConversationId) -> Result<()> {
        let _ = conn.execute(
            "UPDATE conversations SET updated_at = ?2 WHERE id = ?1",
            params![id, now_rfc3339()],
        )?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
