//! # omsorg-server
//!
//! The HTTP surface of the omsorg chat service: a single-endpoint RPC
//! dispatch (`POST /rpc`), a liveness probe and a Prometheus scrape
//! endpoint, plus the `omsorgd` binary that wires settings, store, gateway
//! and services together.
//!
//! Identity is transport-level only: the authenticating reverse proxy puts
//! the user id in the `x-user-id` header and handlers receive it as a typed
//! argument. Method params never carry identity.

#![deny(unsafe_code)]

pub mod http;
pub mod metrics;
pub mod rpc;

pub use http::{AppState, build_router};
