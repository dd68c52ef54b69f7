//! The Axum HTTP surface.
//!
//! Three routes:
//!
//! - `POST /rpc` — the method dispatch endpoint
//! - `GET /health` — liveness probe
//! - `GET /metrics` — Prometheus scrape
//!
//! The caller's identity arrives in the `x-user-id` header, placed there by
//! the hospital's authenticating reverse proxy. Requests without it are
//! rejected before dispatch; params never carry identity.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use omsorg_chat::RequestMeta;
use omsorg_core::ids::UserId;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::metrics::RPC_ERRORS_TOTAL;
use crate::rpc::{ErrorBody, MethodRegistry, RpcContext, RpcRequest};

/// Whole-request deadline. Generous because one `chat.send` includes a
/// gateway round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Request bodies above this are rejected by the limit layer.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    /// The method registry.
    pub registry: Arc<MethodRegistry>,
    /// Store and services.
    pub ctx: Arc<RpcContext>,
    /// Render handle for the scrape endpoint.
    pub metrics: PrometheusHandle,
}

/// Build the router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/rpc", post(rpc_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

/// Liveness probe.
async fn health_handler() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

/// Prometheus scrape body.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    state.metrics.render().into_response()
}

/// Dispatch one RPC request.
async fn rpc_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RpcRequest>,
) -> Response {
    let Some(user) = caller_identity(&headers) else {
        counter!(
            RPC_ERRORS_TOTAL,
            "method" => request.method.clone(),
            "code" => "unauthorized",
        )
        .increment(1);
        return error_response(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid x-user-id header",
        );
    };
    let meta = request_meta(&headers);

    match state
        .registry
        .dispatch(&request.method, request.params, user, &meta, &state.ctx)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => {
            error_response(err.http_status(), err.code(), &err.client_message())
        }
    }
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(ErrorBody::new(code, message))).into_response()
}

/// The authenticated user id, from the `x-user-id` header.
fn caller_identity(headers: &HeaderMap) -> Option<UserId> {
    headers
        .get("x-user-id")?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()
        .map(UserId)
}

/// Audit metadata from the proxy headers. The first `x-forwarded-for` entry
/// is the original client; without one the address is recorded as
/// `"unknown"` rather than left empty.
fn request_meta(headers: &HeaderMap) -> RequestMeta {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| Some("unknown".to_string()));
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    RequestMeta {
        ip_address,
        user_agent,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            let _ = headers.insert(
                axum::http::HeaderName::try_from(*name).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        headers
    }

    #[test]
    fn identity_parses() {
        let headers = headers_with(&[("x-user-id", "42")]);
        assert_eq!(caller_identity(&headers), Some(UserId(42)));
    }

    #[test]
    fn identity_trims_whitespace() {
        let headers = headers_with(&[("x-user-id", " 7 ")]);
        assert_eq!(caller_identity(&headers), Some(UserId(7)));
    }

    #[test]
    fn identity_missing_or_garbage() {
        assert_eq!(caller_identity(&HeaderMap::new()), None);
        let headers = headers_with(&[("x-user-id", "not-a-number")]);
        assert_eq!(caller_identity(&headers), None);
    }

    #[test]
    fn meta_takes_first_forwarded_entry() {
        let headers = headers_with(&[
            ("x-forwarded-for", "203.0.113.9, 10.0.0.1"),
            ("user-agent", "omsorg-web/1.4"),
        ]);
        let meta = request_meta(&headers);
        assert_eq!(meta.ip_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(meta.user_agent.as_deref(), Some("omsorg-web/1.4"));
    }

    #[test]
    fn meta_without_proxy_headers_is_unknown() {
        let meta = request_meta(&HeaderMap::new());
        assert_eq!(meta.ip_address.as_deref(), Some("unknown"));
        assert_eq!(meta.user_agent, None);
    }
}
