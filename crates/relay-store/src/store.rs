//! `MessageStore` — pool-owning facade over the message repository.

use relay_core::ChatMessage;

use crate::connection::ConnectionPool;
use crate::errors::Result;
use crate::repository::MessageRepo;

/// Durable, append-only message log.
///
/// Owns the connection pool; callers never touch raw connections. All
/// methods are synchronous — the server wraps writes in a detached
/// blocking task so storage latency never stalls the broadcast path.
pub struct MessageStore {
    pool: ConnectionPool,
}

impl MessageStore {
    /// Create a store over an existing pool (migrations already run).
    #[must_use]
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Append a message to the log.
    pub fn insert(&self, message: &ChatMessage) -> Result<()> {
        let conn = self.pool.get()?;
        MessageRepo::insert(&conn, message)
    }

    /// The most recent `limit` messages, timestamp ascending.
    pub fn recent(&self, limit: usize) -> Result<Vec<ChatMessage>> {
        let conn = self.pool.get()?;
        MessageRepo::recent(&conn, limit)
    }

    /// Total number of persisted messages.
    pub fn count(&self) -> Result<i64> {
        let conn = self.pool.get()?;
        MessageRepo::count(&conn)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
