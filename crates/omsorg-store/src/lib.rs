//! # omsorg-store
//!
//! SQLite persistence for the omsorg chat service.
//!
//! Layout:
//!
//! - [`connection`] — r2d2 pool over rusqlite with per-connection pragmas
//! - [`migrations`] — embedded SQL stepped by `PRAGMA user_version`
//! - [`row_types`] — flat row structs with RFC 3339 string timestamps
//! - [`repositories`] — stateless per-table repositories; every method takes
//!   a `&Connection`
//! - [`store`] — the high-level [`store::ChatStore`] over the pool, the only
//!   surface the rest of the system uses
//!
//! Writes are atomic at single-statement granularity. The one exception is
//! [`store::ChatStore::append_message`], which inserts the message and bumps
//! the conversation's `updated_at` in a single transaction. There are no
//! cross-operation transactions: each pipeline step of the orchestrator is
//! independently durable, which is what makes partial failure survivable.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod migrations;
pub mod repositories;
pub mod row_types;
pub mod store;

pub use connection::{ConnectionPool, PooledConnection, open_pool};
pub use errors::{Result, StoreError};
pub use store::ChatStore;
