//! Settings types with compiled defaults.

use serde::{Deserialize, Serialize};

/// Top-level settings document (`~/.relay/settings.json`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelaySettings {
    /// Settings schema version.
    pub version: u32,
    /// Server network and runtime settings.
    pub server: ServerSettings,
    /// Durable message storage settings.
    pub storage: StorageSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Server network and runtime settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listening port.
    pub port: u16,
    /// Maximum number of messages kept in the in-memory history buffer.
    pub max_history: usize,
    /// Capacity of each connection's outbound send queue.
    pub send_queue_size: usize,
    /// Maximum accepted WebSocket message size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 8000,
            max_history: 100,
            send_queue_size: 256,
            max_message_size: 64 * 1024,
        }
    }
}

/// Durable message storage settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Whether messages are persisted at all.
    pub enabled: bool,
    /// Path to the message database, relative to `~/.relay` unless
    /// absolute.
    pub db_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            db_path: "messages.db".to_owned(),
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level emitted when `RUST_LOG` is not set.
    pub level: LogLevel,
}

/// Log verbosity level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Debug detail.
    Debug,
    /// Default operational level.
    #[default]
    Info,
    /// Warnings only.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Directive string accepted by `tracing_subscriber::EnvFilter`.
    #[must_use]
    pub fn as_filter_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
