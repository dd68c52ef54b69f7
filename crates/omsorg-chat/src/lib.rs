//! # omsorg-chat
//!
//! The service layer between the RPC surface and the store/gateway crates.
//!
//! - [`orchestrator::ChatOrchestrator`] — the message pipeline: resolve the
//!   conversation, persist the patient turn, assemble the prompt, call the
//!   gateway, persist the assistant turn, audit every milestone
//! - [`consent::ConsentService`] — grant / check / revoke with latest-row-wins
//! - [`escalation::EscalationService`] — human-review requests and their
//!   lifecycle
//! - [`compliance`] — the localized persona prompts, disclosure and
//!   disclaimer texts, and the system preamble builder
//! - [`audit`] — best-effort audit recording; a failed audit write warns and
//!   never changes the primary outcome
//!
//! Nothing here knows about HTTP. Identity and request metadata arrive
//! already extracted, and every fallible operation returns
//! [`errors::ChatError`].

#![deny(unsafe_code)]

pub mod audit;
pub mod compliance;
pub mod consent;
pub mod errors;
pub mod escalation;
pub mod orchestrator;

pub use audit::{AuditRecorder, RequestMeta};
pub use consent::{ConsentService, DATA_PROCESSING_CONSENT};
pub use errors::{ChatError, ChatResult};
pub use escalation::EscalationService;
pub use orchestrator::{ChatOrchestrator, ChatReply};
