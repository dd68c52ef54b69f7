//! Consent repository — append-only history for the `consents` table.
//!
//! A grant inserts a new row; a revoke flips `granted` on the live rows and
//! stamps `revoked_at`. The current state of a (user, type) pair is whatever
//! the newest row says, so history is never lost.

use omsorg_core::ids::{ConsentId, UserId};
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;
use crate::row_types::{ConsentRow, now_rfc3339};

const COLUMNS: &str =
    "id, user_id, consent_type, granted, consent_text, ip_address, created_at, revoked_at";

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConsentRow> {
    Ok(ConsentRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        consent_type: row.get(2)?,
        granted: row.get(3)?,
        consent_text: row.get(4)?,
        ip_address: row.get(5)?,
        created_at: row.get(6)?,
        revoked_at: row.get(7)?,
    })
}

/// Consent repository — stateless, every method takes `&Connection`.
pub struct ConsentRepo;

impl ConsentRepo {
    /// Record a new grant. Always inserts; prior rows are untouched.
    pub fn insert(
        conn: &Connection,
        user_id: UserId,
        consent_type: &str,
        consent_text: &str,
        ip_address: Option<&str>,
    ) -> Result<ConsentRow> {
        let now = now_rfc3339();
        let _ = conn.execute(
            "INSERT INTO consents (user_id, consent_type, granted, consent_text, ip_address, created_at)
             VALUES (?1, ?2, 1, ?3, ?4, ?5)",
            params![user_id, consent_type, consent_text, ip_address, now],
        )?;
        Ok(ConsentRow {
            id: ConsentId(conn.last_insert_rowid()),
            user_id,
            consent_type: consent_type.to_string(),
            granted: true,
            consent_text: consent_text.to_string(),
            ip_address: ip_address.map(String::from),
            created_at: now,
            revoked_at: None,
        })
    }

    /// The newest row for a (user, type) pair, granted or not.
    pub fn latest(
        conn: &Connection,
        user_id: UserId,
        consent_type: &str,
    ) -> Result<Option<ConsentRow>> {
        let row = conn
            .query_row(
                &format!(
                    "SELECT {COLUMNS} FROM consents
                     WHERE user_id = ?1 AND consent_type = ?2
                     ORDER BY created_at DESC, id DESC
                     LIMIT 1"
                ),
                params![user_id, consent_type],
                map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Revoke every live grant of a (user, type) pair. Returns the number of
    /// rows revoked; zero means there was nothing to revoke.
    pub fn revoke(conn: &Connection, user_id: UserId, consent_type: &str) -> Result<usize> {
        let revoked = conn.execute(
            "UPDATE consents
             SET granted = 0, revoked_at = ?3
             WHERE user_id = ?1 AND consent_type = ?2 AND granted = 1 AND revoked_at IS NULL",
            params![user_id, consent_type, now_rfc3339()],
        )?;
        Ok(revoked)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_connection;

    #[test]
    fn insert_then_latest() {
        let conn = test_connection();
        let row =
            ConsentRepo::insert(&conn, UserId(1), "chatbot", "I agree to the terms.", Some("10.0.0.1"))
                .unwrap();
        assert!(row.granted);

        let latest = ConsentRepo::latest(&conn, UserId(1), "chatbot").unwrap().unwrap();
        assert_eq!(latest.id, row.id);
        assert_eq!(latest.ip_address.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn latest_is_scoped_by_type() {
        let conn = test_connection();
        ConsentRepo::insert(&conn, UserId(1), "chatbot", "terms", None).unwrap();
        assert!(ConsentRepo::latest(&conn, UserId(1), "data_sharing").unwrap().is_none());
    }

    #[test]
    fn revoke_flips_live_grants_only() {
        let conn = test_connection();
        ConsentRepo::insert(&conn, UserId(1), "chatbot", "terms", None).unwrap();
        assert_eq!(ConsentRepo::revoke(&conn, UserId(1), "chatbot").unwrap(), 1);

        let latest = ConsentRepo::latest(&conn, UserId(1), "chatbot").unwrap().unwrap();
        assert!(!latest.granted);
        assert!(latest.revoked_at.is_some());

        // Already revoked, nothing left to flip.
        assert_eq!(ConsentRepo::revoke(&conn, UserId(1), "chatbot").unwrap(), 0);
    }

    #[test]
    fn regrant_after_revoke_wins() {
        let conn = test_connection();
        let first = ConsentRepo::insert(&conn, UserId(1), "chatbot", "v1", None).unwrap();
        ConsentRepo::revoke(&conn, UserId(1), "chatbot").unwrap();
        let second = ConsentRepo::insert(&conn, UserId(1), "chatbot", "v2", None).unwrap();
        assert_ne!(first.id, second.id);

        let latest = ConsentRepo::latest(&conn, UserId(1), "chatbot").unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert!(latest.granted);
        assert_eq!(latest.consent_text, "v2");
    }
}
