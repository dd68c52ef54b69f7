//! The consent gate.
//!
//! Consent history is append-only: a grant is always a new row, a revoke
//! stamps the live grant rows. The current answer for a (user, type) pair
//! is whatever the newest row says, so granting again after a revoke turns
//! the gate back on without rewriting history.

use std::sync::Arc;

use omsorg_core::ids::{ConsentId, UserId};
use omsorg_store::ChatStore;
use serde_json::json;
use tracing::instrument;

use crate::audit::{AuditEvent, AuditRecorder, RequestMeta};
use crate::errors::ChatResult;

/// Consent type gating the chat pipeline.
pub const DATA_PROCESSING_CONSENT: &str = "data_processing";

/// Grant, check, and revoke consent records.
#[derive(Clone)]
pub struct ConsentService {
    store: Arc<ChatStore>,
    audit: AuditRecorder,
}

impl ConsentService {
    /// Wire up the service.
    #[must_use]
    pub fn new(store: Arc<ChatStore>, audit: AuditRecorder) -> Self {
        Self { store, audit }
    }

    /// Record a new grant, storing the exact `consent_text` the user saw.
    #[instrument(skip(self, consent_text, meta))]
    pub fn grant(
        &self,
        user: UserId,
        consent_type: &str,
        consent_text: &str,
        meta: &RequestMeta,
    ) -> ChatResult<ConsentId> {
        let row =
            self.store
                .insert_consent(user, consent_type, consent_text, meta.ip_address.as_deref())?;
        self.audit.record(
            AuditEvent::for_user("consent_granted", user)
                .data(json!({ "consentType": consent_type, "consentId": row.id })),
            meta,
        );
        Ok(row.id)
    }

    /// Whether `user` currently holds a live grant of `consent_type`.
    pub fn check(&self, user: UserId, consent_type: &str) -> ChatResult<bool> {
        let latest = self.store.latest_consent(user, consent_type)?;
        Ok(latest.is_some_and(|row| row.granted && row.revoked_at.is_none()))
    }

    /// Revoke every live grant of `consent_type`. Returns how many rows
    /// were stamped; revoking an already-revoked (or never-granted) consent
    /// succeeds with zero.
    #[instrument(skip(self, meta))]
    pub fn revoke(&self, user: UserId, consent_type: &str, meta: &RequestMeta) -> ChatResult<usize> {
        let revoked = self.store.revoke_consent(user, consent_type)?;
        self.audit.record(
            AuditEvent::for_user("consent_revoked", user)
                .data(json!({ "consentType": consent_type, "revoked": revoked })),
            meta,
        );
        Ok(revoked)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
