//! # relay-core
//!
//! Shared types for the Relay chat server:
//!
//! - [`SessionId`] — branded identifier for a live connection
//! - [`ChatMessage`] — an immutable chat message with a server-assigned
//!   timestamp
//! - [`wire`] — the JSON frame types exchanged with clients

#![deny(unsafe_code)]

pub mod ids;
pub mod message;
pub mod wire;

pub use ids::SessionId;
pub use message::ChatMessage;
pub use wire::{ClientFrame, ServerFrame, UserEntry};
