//! Stateless per-table repositories.
//!
//! Every method takes a `&Connection`, so the caller decides pooling and
//! transaction scope. [`crate::store::ChatStore`] is the only production
//! caller; tests hit the repositories directly on in-memory databases.

pub mod audit;
pub mod consent;
pub mod conversation;
pub mod escalation;
pub mod message;

pub use audit::AuditRepo;
pub use consent::ConsentRepo;
pub use conversation::ConversationRepo;
pub use escalation::EscalationRepo;
pub use message::MessageRepo;

#[cfg(test)]
pub(crate) fn test_connection() -> rusqlite::Connection {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    crate::migrations::run_migrations(&conn).unwrap();
    conn
}
