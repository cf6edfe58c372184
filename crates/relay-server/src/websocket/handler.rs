//! Per-frame protocol dispatch.
//!
//! Every inbound frame is handled independently; parse failures and
//! unknown frame types are logged and dropped so no payload can ever take
//! the connection down.

use std::sync::Arc;

use relay_core::{ChatMessage, ClientFrame, ServerFrame};
use relay_store::MessageStore;
use tracing::{debug, warn};

use super::connection::ClientSession;
use crate::server::AppState;

/// Handle one inbound text frame from `session`.
pub async fn handle_frame(text: &str, session: &ClientSession, state: &AppState) {
    let frame = match ClientFrame::parse(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(session_id = %session.id, error = %e, "discarding malformed frame");
            return;
        }
    };

    match frame {
        ClientFrame::Message { content } => {
            // Username and timestamp are server-authoritative; whatever the
            // client put in those fields was discarded at parse time.
            let message = ChatMessage::now(session.username.clone(), content);
            state.history.append(message.clone());
            if let Some(store) = &state.store {
                spawn_persist(store.clone(), message.clone());
            }
            state
                .registry
                .broadcast_all(&ServerFrame::message(message))
                .await;
        }
        ClientFrame::GetHistory => {
            let frame = ServerFrame::history(state.history.snapshot());
            if !state.registry.send_to(&session.id, &frame).await {
                debug!(session_id = %session.id, "history requester already gone");
            }
        }
        ClientFrame::Unknown(value) => {
            let frame_type = value
                .get("type")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("<missing>");
            warn!(session_id = %session.id, frame_type, "ignoring unknown frame type");
        }
    }
}

/// Mirror a message to the durable store without joining the broadcast
/// path. Failures are logged and otherwise invisible to clients.
fn spawn_persist(store: Arc<MessageStore>, message: ChatMessage) {
    drop(tokio::task::spawn_blocking(move || {
        if let Err(e) = store.insert(&message) {
            warn!(error = %e, "failed to persist message");
        }
    }));
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
