//! Per-connection session state.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use relay_core::{ServerFrame, SessionId};
use tokio::sync::mpsc;

/// The live association between one open WebSocket and a declared
/// username.
///
/// Created by the gateway on upgrade and owned (behind `Arc`) by the
/// session registry until the connection closes. Sends go through a
/// bounded channel drained by the connection's writer task; `try_send`
/// keeps every delivery non-blocking.
pub struct ClientSession {
    /// Unique session id, generated at connection time.
    pub id: SessionId,
    /// Self-declared username from the connection URL. May be empty and
    /// is not guaranteed unique.
    pub username: String,
    /// When the session was established.
    pub joined_at: DateTime<Utc>,
    /// Send half of the outbound queue.
    tx: mpsc::Sender<String>,
    /// Count of messages dropped due to a full or closed queue.
    dropped_messages: AtomicU64,
}

impl ClientSession {
    /// Create a session for a freshly-upgraded connection.
    #[must_use]
    pub fn new(username: String, tx: mpsc::Sender<String>) -> Self {
        Self {
            id: SessionId::new(),
            username,
            joined_at: Utc::now(),
            tx,
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Enqueue a text payload for this connection.
    ///
    /// Returns `false` if the queue is full or the connection is gone, and
    /// increments the dropped counter. Never blocks.
    pub fn send(&self, message: String) -> bool {
        if self.tx.try_send(message).is_ok() {
            true
        } else {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Serialize a frame and enqueue it.
    pub fn send_frame(&self, frame: &ServerFrame) -> bool {
        match serde_json::to_string(frame) {
            Ok(json) => self.send(json),
            Err(_) => false,
        }
    }

    /// Total messages dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_session(username: &str) -> (ClientSession, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(32);
        (ClientSession::new(username.into(), tx), rx)
    }

    #[test]
    fn new_session_has_fresh_id() {
        let (a, _rx1) = make_session("alice");
        let (b, _rx2) = make_session("alice");
        assert_ne!(a.id, b.id);
        assert_eq!(a.username, "alice");
    }

    #[test]
    fn empty_username_accepted() {
        let (session, _rx) = make_session("");
        assert_eq!(session.username, "");
    }

    #[tokio::test]
    async fn send_delivers_to_channel() {
        let (session, mut rx) = make_session("alice");
        assert!(session.send("hello".into()));
        assert_eq!(rx.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn send_to_closed_channel_returns_false() {
        let (tx, rx) = mpsc::channel(32);
        let session = ClientSession::new("alice".into(), tx);
        drop(rx);
        assert!(!session.send("hello".into()));
        assert_eq!(session.drop_count(), 1);
    }

    #[tokio::test]
    async fn send_to_full_channel_drops() {
        let (tx, _rx) = mpsc::channel(1);
        let session = ClientSession::new("alice".into(), tx);
        assert!(session.send("first".into()));
        assert!(!session.send("second".into()));
        assert_eq!(session.drop_count(), 1);
    }

    #[tokio::test]
    async fn send_frame_serializes() {
        let (session, mut rx) = make_session("alice");
        let frame = ServerFrame::users(vec!["alice".to_owned()]);
        assert!(session.send_frame(&frame));
        let json = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "users");
        assert_eq!(value["users"][0]["username"], "alice");
    }

    #[tokio::test]
    async fn send_order_preserved() {
        let (session, mut rx) = make_session("alice");
        for i in 0..5 {
            assert!(session.send(format!("msg_{i}")));
        }
        for i in 0..5 {
            assert_eq!(rx.recv().await.unwrap(), format!("msg_{i}"));
        }
    }
}
