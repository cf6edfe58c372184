//! # relay-settings
//!
//! Layered configuration: compiled defaults, an optional
//! `~/.relay/settings.json` deep-merged over them, and `RELAY_*`
//! environment variable overrides on top.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{load_settings, load_settings_from_path, settings_path};
pub use types::{LogLevel, LoggingSettings, RelaySettings, ServerSettings, StorageSettings};
