//! # relay-server
//!
//! The chat relay core:
//!
//! - WebSocket gateway (axum upgrade, username from the query string)
//! - Session registry with roster broadcasts on join/leave
//! - Bounded in-memory history buffer, optionally pre-loaded from and
//!   mirrored to the durable store
//! - Per-frame protocol dispatch where no inbound error is ever fatal to
//!   the connection
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod history;
pub mod server;
pub mod shutdown;
pub mod websocket;
