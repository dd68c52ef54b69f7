//! Escalation repository — lifecycle rows for the `escalations` table.

use omsorg_core::ids::{ConversationId, EscalationId, MessageId, UserId};
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;
use crate::row_types::{EscalationRow, EscalationStatus, EscalationUpdate, now_rfc3339};

const COLUMNS: &str = "id, user_id, conversation_id, message_id, reason, status, \
                       assigned_to, resolution, created_at, resolved_at";

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EscalationRow> {
    Ok(EscalationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        conversation_id: row.get(2)?,
        message_id: row.get(3)?,
        reason: row.get(4)?,
        status: row.get(5)?,
        assigned_to: row.get(6)?,
        resolution: row.get(7)?,
        created_at: row.get(8)?,
        resolved_at: row.get(9)?,
    })
}

/// Escalation repository — stateless, every method takes `&Connection`.
pub struct EscalationRepo;

impl EscalationRepo {
    /// File a new pending escalation.
    pub fn insert(
        conn: &Connection,
        user_id: UserId,
        conversation_id: ConversationId,
        message_id: Option<MessageId>,
        reason: &str,
    ) -> Result<EscalationRow> {
        let now = now_rfc3339();
        let _ = conn.execute(
            "INSERT INTO escalations (user_id, conversation_id, message_id, reason, status, created_at)
             VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
            params![user_id, conversation_id, message_id, reason, now],
        )?;
        Ok(EscalationRow {
            id: EscalationId(conn.last_insert_rowid()),
            user_id,
            conversation_id,
            message_id,
            reason: reason.to_string(),
            status: EscalationStatus::Pending,
            assigned_to: None,
            resolution: None,
            created_at: now,
            resolved_at: None,
        })
    }

    /// Get an escalation by id.
    pub fn get_by_id(conn: &Connection, id: EscalationId) -> Result<Option<EscalationRow>> {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM escalations WHERE id = ?1"),
                params![id],
                map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Apply a status update. `resolved_at` is stamped exactly when the new
    /// status is `resolved`; any status may follow any other, so a reopened
    /// escalation has its stamp cleared again.
    ///
    /// Returns the updated row, or `None` if the id does not exist.
    pub fn update(
        conn: &Connection,
        id: EscalationId,
        update: &EscalationUpdate,
    ) -> Result<Option<EscalationRow>> {
        let resolved_at = match update.status {
            EscalationStatus::Resolved => Some(now_rfc3339()),
            _ => None,
        };
        let changed = conn.execute(
            "UPDATE escalations
             SET status = ?2,
                 assigned_to = COALESCE(?3, assigned_to),
                 resolution = COALESCE(?4, resolution),
                 resolved_at = ?5
             WHERE id = ?1",
            params![id, update.status, update.assigned_to, update.resolution, resolved_at],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        Self::get_by_id(conn, id)
    }

    /// All pending escalations, oldest first so reviewers work a queue.
    pub fn list_pending(conn: &Connection) -> Result<Vec<EscalationRow>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM escalations
             WHERE status = 'pending'
             ORDER BY created_at ASC, id ASC"
        ))?;
        let rows = stmt
            .query_map([], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
