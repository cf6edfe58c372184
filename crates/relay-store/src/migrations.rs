//! Schema migrations for the message log.

use rusqlite::Connection;

use crate::errors::{Result, StoreError};

/// Create the message log schema if it does not exist.
///
/// The log is append-only: there are no update or delete paths anywhere in
/// this crate, and `id` preserves insertion order as a tie-break for
/// messages sharing a timestamp.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS messages (
             id        INTEGER PRIMARY KEY AUTOINCREMENT,
             username  TEXT NOT NULL,
             content   TEXT NOT NULL,
             timestamp TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_messages_timestamp
             ON messages (timestamp);",
    )
    .map_err(|e| StoreError::Migration {
        message: format!("messages schema: {e}"),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{new_in_memory, ConnectionConfig};

    #[test]
    fn creates_messages_table() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='messages'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn migrations_are_idempotent() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
    }

    #[test]
    fn creates_timestamp_index() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name='idx_messages_timestamp'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
