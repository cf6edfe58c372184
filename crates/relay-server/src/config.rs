//! Server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the relay server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Maximum number of messages kept in the history buffer.
    pub max_history: usize,
    /// Capacity of each connection's outbound send queue.
    pub send_queue_size: usize,
    /// Max WebSocket message size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_history: 100,
            send_queue_size: 256,
            max_message_size: 64 * 1024,
        }
    }
}
