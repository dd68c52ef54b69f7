//! Shared context handed to every method handler.

use std::sync::Arc;

use omsorg_chat::{ChatOrchestrator, ConsentService, EscalationService};
use omsorg_store::ChatStore;

/// Everything a handler can reach: the store plus the three services built
/// over it. Constructed once at startup and shared behind an [`Arc`].
pub struct RpcContext {
    /// Direct store access, for handlers that read without service logic.
    pub store: Arc<ChatStore>,
    /// The chat message pipeline.
    pub orchestrator: ChatOrchestrator,
    /// Consent grant / check / revoke.
    pub consent: ConsentService,
    /// Escalation lifecycle.
    pub escalation: EscalationService,
}

impl RpcContext {
    /// Bundle the store and services into a context.
    pub fn new(
        store: Arc<ChatStore>,
        orchestrator: ChatOrchestrator,
        consent: ConsentService,
        escalation: EscalationService,
    ) -> Self {
        Self {
            store,
            orchestrator,
            consent,
            escalation,
        }
    }
}
