//! Session registry and broadcast fan-out.
//!
//! One owned state object guards the whole live-connection set: the
//! registry's `RwLock` is the single coordination point for joins, leaves,
//! roster reads, and fan-out, so concurrent connection handlers can never
//! observe a torn roster or lose a registration.

use std::collections::HashMap;
use std::sync::Arc;

use relay_core::{ServerFrame, SessionId};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::connection::ClientSession;

/// Registry of live sessions, doubling as the broadcast dispatcher.
pub struct SessionRegistry {
    /// Live sessions indexed by session id.
    sessions: RwLock<HashMap<SessionId, Arc<ClientSession>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Add a session to the live set.
    pub async fn register(&self, session: Arc<ClientSession>) {
        let mut sessions = self.sessions.write().await;
        let _ = sessions.insert(session.id.clone(), session);
    }

    /// Remove a session by id. Unknown ids are a no-op.
    pub async fn deregister(&self, id: &SessionId) {
        let mut sessions = self.sessions.write().await;
        let _ = sessions.remove(id);
    }

    /// Every live session's username, duplicates included.
    pub async fn usernames(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        sessions.values().map(|s| s.username.clone()).collect()
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Deliver a frame to every live session, best-effort.
    ///
    /// The frame is serialized once; a session whose queue is full or
    /// whose connection is gone is skipped with a warning.
    pub async fn broadcast_all(&self, frame: &ServerFrame) {
        let json = match serde_json::to_string(frame) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, "failed to serialize broadcast frame");
                return;
            }
        };
        let sessions = self.sessions.read().await;
        debug!(recipients = sessions.len(), "broadcasting frame");
        for session in sessions.values() {
            if !session.send(json.clone()) {
                warn!(session_id = %session.id, "failed to enqueue frame for session");
            }
        }
    }

    /// Deliver a frame to exactly one session.
    ///
    /// Returns `false` when the session is unknown (recipient gone) or its
    /// queue rejected the frame; both are silent skips, not errors.
    pub async fn send_to(&self, id: &SessionId, frame: &ServerFrame) -> bool {
        let sessions = self.sessions.read().await;
        match sessions.get(id) {
            Some(session) => session.send_frame(frame),
            None => false,
        }
    }

    /// Broadcast the current roster as a full-replacement `users` frame.
    ///
    /// Roster computation and fan-out happen under a single lock
    /// acquisition, so every recipient of one call sees the same roster.
    pub async fn broadcast_roster(&self) {
        let sessions = self.sessions.read().await;
        let frame = ServerFrame::users(sessions.values().map(|s| s.username.clone()));
        let json = match serde_json::to_string(&frame) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, "failed to serialize roster frame");
                return;
            }
        };
        debug!(recipients = sessions.len(), "broadcasting roster");
        for session in sessions.values() {
            if !session.send(json.clone()) {
                warn!(session_id = %session.id, "failed to enqueue roster for session");
            }
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
