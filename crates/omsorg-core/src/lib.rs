//! # omsorg-core
//!
//! Foundation types and shared vocabulary for the omsorg chat service.
//!
//! This crate provides what every other omsorg crate depends on:
//!
//! - **Branded IDs**: [`ids::UserId`], [`ids::ConversationId`], [`ids::MessageId`]
//!   and friends as `i64` newtypes over SQLite rowids
//! - **Messages**: [`messages::Role`], [`messages::Language`], and
//!   [`messages::PromptMessage`] — the ordered role-tagged unit sent to the
//!   LLM gateway
//! - **Logging**: [`logging::init_tracing`] for the binary's subscriber setup
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other omsorg crates.

#![deny(unsafe_code)]

pub mod ids;
pub mod logging;
pub mod messages;
