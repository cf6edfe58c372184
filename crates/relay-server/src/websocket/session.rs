//! WebSocket session lifecycle — handles a single connected client from
//! upgrade through disconnect.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use relay_core::ServerFrame;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::connection::ClientSession;
use super::handler::handle_frame;
use crate::server::AppState;

/// Run a WebSocket session for a connected client.
///
/// 1. Registers the session
/// 2. Sends the history snapshot to the new connection
/// 3. Broadcasts the updated roster to everyone (the new client included)
/// 4. Dispatches inbound frames to the protocol handler for the
///    connection's lifetime
/// 5. On close, transport error, or server shutdown: deregisters and
///    rebroadcasts the roster
pub async fn run_ws_session(ws: WebSocket, username: String, state: AppState) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    let (send_tx, mut send_rx) = mpsc::channel::<String>(state.config.send_queue_size);
    let session = Arc::new(ClientSession::new(username, send_tx));
    info!(session_id = %session.id, username = %session.username, "client connected");

    state.registry.register(session.clone()).await;

    // The snapshot goes straight onto the socket, ahead of anything queued
    // on the send channel, so history always precedes the join roster.
    let snapshot = ServerFrame::history(state.history.snapshot());
    if let Ok(json) = serde_json::to_string(&snapshot) {
        let _ = ws_tx.send(Message::Text(json.into())).await;
    }
    state.registry.broadcast_roster().await;

    // Outbound forwarder: drains the send queue onto the socket.
    let outbound = tokio::spawn(async move {
        while let Some(text) = send_rx.recv().await {
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let shutdown = state.shutdown.token();
    loop {
        let event = tokio::select! {
            event = ws_rx.next() => event,
            () = shutdown.cancelled() => {
                debug!(session_id = %session.id, "closing session for shutdown");
                break;
            }
        };
        let Some(event) = event else { break };

        let msg = match event {
            Ok(msg) => msg,
            Err(e) => {
                // A transport error is an implicit close, not a distinct
                // terminal state.
                info!(session_id = %session.id, error = %e, "transport error, closing session");
                break;
            }
        };

        let text = match msg {
            Message::Text(text) => Some(text.to_string()),
            Message::Binary(ref data) => match std::str::from_utf8(data) {
                Ok(s) => Some(s.to_owned()),
                Err(_) => {
                    debug!(session_id = %session.id, len = data.len(), "skipping non-UTF8 binary frame");
                    None
                }
            },
            Message::Close(_) => {
                debug!(session_id = %session.id, "client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => None,
        };

        if let Some(text) = text {
            handle_frame(&text, &session, &state).await;
        }
    }

    info!(
        session_id = %session.id,
        username = %session.username,
        dropped = session.drop_count(),
        "client disconnected"
    );
    outbound.abort();
    state.registry.deregister(&session.id).await;
    state.registry.broadcast_roster().await;
}

// Session behavior over a live socket (join/leave rosters, history-first
// ordering, malformed-frame survival) is covered end-to-end in
// tests/ws.rs.
