//! The chat message model.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A single chat message. Immutable once created; the timestamp is always
/// assigned from the server clock, never taken from the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Text body as submitted by the client.
    pub content: String,
    /// Username of the session that posted the message.
    pub username: String,
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub timestamp: String,
}

impl ChatMessage {
    /// Build a message stamped with the current server time.
    #[must_use]
    pub fn now(username: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            username: username.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
