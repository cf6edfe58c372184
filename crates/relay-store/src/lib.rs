//! # relay-store
//!
//! The durable collaborator: an append-only SQLite log of chat messages
//! behind an `r2d2` connection pool. The server treats it as optional and
//! fire-and-forget — a write failure never reaches the broadcast path.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod migrations;
pub mod repository;
pub mod store;

pub use connection::{new_file, new_in_memory, ConnectionConfig, ConnectionPool};
pub use errors::{Result, StoreError};
pub use migrations::run_migrations;
pub use store::MessageStore;
