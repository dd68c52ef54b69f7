//! `consent.*` handlers.

use async_trait::async_trait;
use omsorg_chat::RequestMeta;
use omsorg_core::ids::UserId;
use serde_json::{Value, json};
use tracing::instrument;

use crate::rpc::context::RpcContext;
use crate::rpc::errors::RpcError;
use crate::rpc::handlers::require_string_param;
use crate::rpc::registry::MethodHandler;

/// `consent.grant` — record a consent grant for the caller.
///
/// Params: `consentType` (string), `consentText` (string; the exact wording
/// shown to the patient, stored verbatim for the audit trail).
pub struct GrantHandler;

#[async_trait]
impl MethodHandler for GrantHandler {
    #[instrument(skip_all, fields(method = "consent.grant", user = user.as_i64()))]
    async fn handle(
        &self,
        params: Option<Value>,
        user: UserId,
        meta: &RequestMeta,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        let consent_type = require_string_param(&params, "consentType")?;
        let consent_text = require_string_param(&params, "consentText")?;
        let consent_id = ctx
            .consent
            .grant(user, &consent_type, &consent_text, meta)?;
        Ok(json!({ "success": true, "consentId": consent_id }))
    }
}

/// `consent.check` — whether the caller's most recent record of a consent
/// type is a grant.
///
/// Params: `consentType` (string).
pub struct CheckHandler;

#[async_trait]
impl MethodHandler for CheckHandler {
    #[instrument(skip_all, fields(method = "consent.check", user = user.as_i64()))]
    async fn handle(
        &self,
        params: Option<Value>,
        user: UserId,
        _meta: &RequestMeta,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        let consent_type = require_string_param(&params, "consentType")?;
        let has_consent = ctx.consent.check(user, &consent_type)?;
        Ok(json!({ "hasConsent": has_consent }))
    }
}

/// `consent.revoke` — revoke every active grant of a consent type.
///
/// Params: `consentType` (string). Revoking when nothing is granted succeeds
/// with `revoked: 0`.
pub struct RevokeHandler;

#[async_trait]
impl MethodHandler for RevokeHandler {
    #[instrument(skip_all, fields(method = "consent.revoke", user = user.as_i64()))]
    async fn handle(
        &self,
        params: Option<Value>,
        user: UserId,
        meta: &RequestMeta,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        let consent_type = require_string_param(&params, "consentType")?;
        let revoked = ctx.consent.revoke(user, &consent_type, meta)?;
        Ok(json!({ "success": true, "revoked": revoked }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::handlers::test_helpers::make_test_context;
    use omsorg_chat::DATA_PROCESSING_CONSENT;

    fn grant_params() -> Option<Value> {
        Some(json!({
            "consentType": DATA_PROCESSING_CONSENT,
            "consentText": "I consent to processing of my health data.",
        }))
    }

    #[tokio::test]
    async fn grant_then_check() {
        let (ctx, _dir) = make_test_context();
        let user = UserId(1);
        let meta = RequestMeta::empty();

        let granted = GrantHandler
            .handle(grant_params(), user, &meta, &ctx)
            .await
            .unwrap();
        assert_eq!(granted["success"], true);
        assert!(granted["consentId"].as_i64().is_some());

        let checked = CheckHandler
            .handle(
                Some(json!({"consentType": DATA_PROCESSING_CONSENT})),
                user,
                &meta,
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(checked["hasConsent"], true);
    }

    #[tokio::test]
    async fn check_unknown_type_false() {
        let (ctx, _dir) = make_test_context();
        let checked = CheckHandler
            .handle(
                Some(json!({"consentType": "research_contact"})),
                UserId(1),
                &RequestMeta::empty(),
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(checked["hasConsent"], false);
    }

    #[tokio::test]
    async fn revoke_flips_check() {
        let (ctx, _dir) = make_test_context();
        let user = UserId(1);
        let meta = RequestMeta::empty();

        let _ = GrantHandler
            .handle(grant_params(), user, &meta, &ctx)
            .await
            .unwrap();
        let revoked = RevokeHandler
            .handle(
                Some(json!({"consentType": DATA_PROCESSING_CONSENT})),
                user,
                &meta,
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(revoked["success"], true);
        assert_eq!(revoked["revoked"], 1);

        let checked = CheckHandler
            .handle(
                Some(json!({"consentType": DATA_PROCESSING_CONSENT})),
                user,
                &meta,
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(checked["hasConsent"], false);
    }

    #[tokio::test]
    async fn revoke_without_grant_is_zero() {
        let (ctx, _dir) = make_test_context();
        let revoked = RevokeHandler
            .handle(
                Some(json!({"consentType": DATA_PROCESSING_CONSENT})),
                UserId(1),
                &RequestMeta::empty(),
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(revoked["revoked"], 0);
    }

    #[tokio::test]
    async fn grant_requires_text() {
        let (ctx, _dir) = make_test_context();
        let err = GrantHandler
            .handle(
                Some(json!({"consentType": DATA_PROCESSING_CONSENT})),
                UserId(1),
                &RequestMeta::empty(),
                &ctx,
            )
            .await
            .unwrap_err();
        assert_eq!(err.client_message(), "missing field: consentText");
    }

    #[tokio::test]
    async fn consent_is_per_user() {
        let (ctx, _dir) = make_test_context();
        let meta = RequestMeta::empty();
        let _ = GrantHandler
            .handle(grant_params(), UserId(1), &meta, &ctx)
            .await
            .unwrap();

        let checked = CheckHandler
            .handle(
                Some(json!({"consentType": DATA_PROCESSING_CONSENT})),
                UserId(2),
                &meta,
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(checked["hasConsent"], false);
    }
}
