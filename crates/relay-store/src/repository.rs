//! Message repository — stateless, every method takes `&Connection`.

use relay_core::ChatMessage;
use rusqlite::{params, Connection};

use crate::errors::Result;

/// Low-level operations on the `messages` table.
pub struct MessageRepo;

impl MessageRepo {
    /// Append a message to the log.
    pub fn insert(conn: &Connection, message: &ChatMessage) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO messages (username, content, timestamp) VALUES (?1, ?2, ?3)",
            params![message.username, message.content, message.timestamp],
        )?;
        Ok(())
    }

    /// The most recent `limit` messages, ordered timestamp ascending.
    ///
    /// Insertion id breaks ties between messages sharing a timestamp so the
    /// relative order of a burst survives the round trip.
    pub fn recent(conn: &Connection, limit: usize) -> Result<Vec<ChatMessage>> {
        let mut stmt = conn.prepare(
            "SELECT username, content, timestamp FROM (
                 SELECT id, username, content, timestamp FROM messages
                 ORDER BY timestamp DESC, id DESC LIMIT ?1
             ) ORDER BY timestamp ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(ChatMessage {
                username: row.get(0)?,
                content: row.get(1)?,
                timestamp: row.get(2)?,
            })
        })?;
        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Total number of persisted messages.
    pub fn count(conn: &Connection) -> Result<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM messages", [], |r| r.get(0))?;
        Ok(count)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{new_in_memory, ConnectionConfig};
    use crate::migrations::run_migrations;

    fn setup() -> crate::connection::ConnectionPool {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        {
            let conn = pool.get().unwrap();
            run_migrations(&conn).unwrap();
        }
        pool
    }

    fn msg(username: &str, content: &str, timestamp: &str) -> ChatMessage {
        ChatMessage {
            username: username.into(),
            content: content.into(),
            timestamp: timestamp.into(),
        }
    }

    #[test]
    fn insert_and_count() {
        let pool = setup();
        let conn = pool.get().unwrap();
        assert_eq!(MessageRepo::count(&conn).unwrap(), 0);
        MessageRepo::insert(&conn, &msg("alice", "hi", "2026-08-06T10:00:00.000Z")).unwrap();
        assert_eq!(MessageRepo::count(&conn).unwrap(), 1);
    }

    #[test]
    fn recent_returns_ascending_order() {
        let pool = setup();
        let conn = pool.get().unwrap();
        MessageRepo::insert(&conn, &msg("a", "first", "2026-08-06T10:00:00.000Z")).unwrap();
        MessageRepo::insert(&conn, &msg("b", "second", "2026-08-06T10:00:01.000Z")).unwrap();
        MessageRepo::insert(&conn, &msg("c", "third", "2026-08-06T10:00:02.000Z")).unwrap();

        let messages = MessageRepo::recent(&conn, 10).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[2].content, "third");
    }

    #[test]
    fn recent_keeps_only_newest() {
        let pool = setup();
        let conn = pool.get().unwrap();
        for i in 0..5 {
            MessageRepo::insert(
                &conn,
                &msg("a", &format!("m{i}"), &format!("2026-08-06T10:00:0{i}.000Z")),
            )
            .unwrap();
        }

        let messages = MessageRepo::recent(&conn, 2).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "m3");
        assert_eq!(messages[1].content, "m4");
    }

    #[test]
    fn recent_ties_broken_by_insertion_order() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let ts = "2026-08-06T10:00:00.000Z";
        MessageRepo::insert(&conn, &msg("a", "one", ts)).unwrap();
        MessageRepo::insert(&conn, &msg("a", "two", ts)).unwrap();
        MessageRepo::insert(&conn, &msg("a", "three", ts)).unwrap();

        let messages = MessageRepo::recent(&conn, 10).unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["one", "two", "three"]);
    }

    #[test]
    fn recent_on_empty_table() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let messages = MessageRepo::recent(&conn, 100).unwrap();
        assert!(messages.is_empty());
    }
}
