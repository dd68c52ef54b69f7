//! # omsorg-llm
//!
//! The LLM boundary of the chat service.
//!
//! [`gateway::Gateway`] is the seam the orchestrator talks through; the only
//! production implementation is [`openai::OpenAiGateway`], a non-streaming
//! client for OpenAI-compatible chat completions endpoints. Tests substitute
//! their own `Gateway` impls, so nothing above this crate knows about HTTP.

#![deny(unsafe_code)]

pub mod gateway;
pub mod openai;

pub use gateway::{Completion, Gateway, GatewayError, GatewayResult};
pub use openai::{OpenAiConfig, OpenAiGateway};
