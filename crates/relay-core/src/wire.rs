//! JSON wire frames exchanged with clients.
//!
//! Inbound frames parse into the closed [`ClientFrame`] variant; anything
//! that is valid JSON but carries no recognized `type` discriminator lands
//! in [`ClientFrame::Unknown`] so the caller can log and ignore it without
//! the connection ever seeing a hard failure. Outbound frames are the
//! [`ServerFrame`] enum, tagged the same way.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::ChatMessage;

/// A frame received from a client, after parsing.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientFrame {
    /// Post a chat message. Client-supplied `username`/`timestamp` fields
    /// are tolerated on the wire and discarded here; the server substitutes
    /// its own.
    Message {
        /// Text body of the message.
        content: String,
    },
    /// Request the full history snapshot.
    GetHistory,
    /// Valid JSON with an unrecognized or missing `type`. Carried verbatim
    /// for logging.
    Unknown(Value),
}

/// The recognized subset of the inbound protocol.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownFrame {
    Message { content: String },
    GetHistory,
}

impl ClientFrame {
    /// Parse a raw text frame.
    ///
    /// Returns `Err` only when the payload is not JSON at all; a JSON
    /// payload that doesn't match a known shape becomes [`Self::Unknown`].
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        match KnownFrame::deserialize(&value) {
            Ok(KnownFrame::Message { content }) => Ok(Self::Message { content }),
            Ok(KnownFrame::GetHistory) => Ok(Self::GetHistory),
            Err(_) => Ok(Self::Unknown(value)),
        }
    }
}

/// One entry in a roster (`users`) frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    /// Self-declared username; not guaranteed unique.
    pub username: String,
}

/// A frame sent to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A single broadcast chat message.
    Message {
        /// The message, flattened into the frame body.
        #[serde(flatten)]
        message: ChatMessage,
    },
    /// Recent history, oldest first. Each entry is itself a full `message`
    /// frame so clients can treat history entries and live broadcasts
    /// uniformly.
    History {
        /// Message frames, oldest first.
        messages: Vec<ServerFrame>,
    },
    /// Full roster replacement (not a delta).
    Users {
        /// Every live session's username, duplicates included.
        users: Vec<UserEntry>,
    },
}

impl ServerFrame {
    /// Wrap a chat message as a broadcast frame.
    #[must_use]
    pub fn message(message: ChatMessage) -> Self {
        Self::Message { message }
    }

    /// Build a history frame from a snapshot, oldest first.
    #[must_use]
    pub fn history(messages: Vec<ChatMessage>) -> Self {
        Self::History {
            messages: messages.into_iter().map(Self::message).collect(),
        }
    }

    /// Build a roster frame from the live usernames.
    #[must_use]
    pub fn users(usernames: impl IntoIterator<Item = String>) -> Self {
        Self::Users {
            users: usernames
                .into_iter()
                .map(|username| UserEntry { username })
                .collect(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
