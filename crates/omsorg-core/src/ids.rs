//! Branded identifier newtypes.
//!
//! Every persisted entity is keyed by an opaque, monotonically-assigned
//! numeric identifier (SQLite `INTEGER PRIMARY KEY AUTOINCREMENT`). The
//! newtypes keep a `ConversationId` from being passed where a `MessageId`
//! is expected; conversion from the raw `i64` is explicit.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Raw database value.
            #[must_use]
            pub fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                self.0.to_sql()
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                i64::column_result(value).map(Self)
            }
        }
    };
}

id_type!(
    /// External user identity; referenced by id only within this core.
    UserId
);
id_type!(
    /// A conversation owned by exactly one user.
    ConversationId
);
id_type!(
    /// A message within a conversation.
    MessageId
);
id_type!(
    /// One row of consent history.
    ConsentId
);
id_type!(
    /// A human-review request.
    EscalationId
);
id_type!(
    /// An append-only audit log entry.
    AuditEntryId
);

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_is_transparent() {
        let id = ConversationId(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: ConversationId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn display_is_raw_value() {
        assert_eq!(MessageId(7).to_string(), "7");
    }

    #[test]
    fn sql_round_trip() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let id: UserId = conn
            .query_row("SELECT ?1", [UserId(99)], |row| row.get(0))
            .unwrap();
        assert_eq!(id, UserId(99));
    }
}
