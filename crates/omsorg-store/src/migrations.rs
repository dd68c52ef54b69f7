//! Embedded schema migrations stepped by `PRAGMA user_version`.
//!
//! Each entry in [`MIGRATIONS`] is one versioned batch; version N applies
//! `MIGRATIONS[N-1]`. Applied batches are never edited, only appended.

use rusqlite::Connection;
use tracing::info;

use crate::errors::Result;

const MIGRATIONS: &[&str] = &[
    // v1: full schema.
    "
    CREATE TABLE conversations (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id       INTEGER NOT NULL,
        language      TEXT    NOT NULL DEFAULT 'en',
        consent_given INTEGER NOT NULL DEFAULT 0,
        created_at    TEXT    NOT NULL,
        updated_at    TEXT    NOT NULL
    );

    CREATE TABLE messages (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        conversation_id INTEGER NOT NULL REFERENCES conversations(id),
        role            TEXT    NOT NULL CHECK (role IN ('user', 'assistant', 'system')),
        content         TEXT    NOT NULL,
        language        TEXT    NOT NULL,
        created_at      TEXT    NOT NULL
    );
    CREATE INDEX idx_messages_conversation ON messages(conversation_id, created_at);

    CREATE TABLE consents (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id      INTEGER NOT NULL,
        consent_type TEXT    NOT NULL,
        granted      INTEGER NOT NULL DEFAULT 1,
        consent_text TEXT    NOT NULL,
        ip_address   TEXT,
        created_at   TEXT    NOT NULL,
        revoked_at   TEXT
    );
    CREATE INDEX idx_consents_user ON consents(user_id, consent_type);

    CREATE TABLE escalations (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id         INTEGER NOT NULL,
        conversation_id INTEGER NOT NULL REFERENCES conversations(id),
        message_id      INTEGER REFERENCES messages(id),
        reason          TEXT    NOT NULL,
        status          TEXT    NOT NULL DEFAULT 'pending'
                        CHECK (status IN ('pending', 'assigned', 'resolved')),
        assigned_to     TEXT,
        resolution      TEXT,
        created_at      TEXT    NOT NULL,
        resolved_at     TEXT
    );
    CREATE INDEX idx_escalations_status ON escalations(status, created_at);

    -- Audit rows outlive the entities they point at, so the references are
    -- deliberately unconstrained.
    CREATE TABLE audit_log (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id         INTEGER,
        conversation_id INTEGER,
        message_id      INTEGER,
        event_type      TEXT NOT NULL,
        event_data      TEXT,
        ip_address      TEXT,
        user_agent      TEXT,
        created_at      TEXT NOT NULL
    );
    CREATE INDEX idx_audit_conversation ON audit_log(conversation_id);
    CREATE INDEX idx_audit_user ON audit_log(user_id);
    ",
];

/// Bring the database up to the latest schema version.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    let target = MIGRATIONS.len() as i64;

    for version in current..target {
        let batch = MIGRATIONS[version as usize];
        conn.execute_batch(batch)?;
        conn.pragma_update(None, "user_version", version + 1)?;
        info!(version = version + 1, "applied migration");
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
