//! Axum router and all HTTP handlers for pesa-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, warn};

use crate::{
    api_types::{CallbackAck, HealthResponse},
    state::AppState,
};
use pesa_reconcile::{normalize, reconcile, ReconcileOutcome};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/api/callback", post(callback))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /api/callback
// ---------------------------------------------------------------------------

/// Gateway delivery endpoint.
///
/// A payload without the `Body.stkCallback` envelope is the only transport
/// error (400, plain text, no store access). Every well-formed callback is
/// acknowledged with `200 {"result":"received"}` whatever the reconciliation
/// outcome; the outcome is logged at a level matching its severity.
pub(crate) async fn callback(
    State(st): State<Arc<AppState>>,
    Json(raw): Json<serde_json::Value>,
) -> Response {
    tracing::debug!(payload = %raw, "gateway callback received");

    let notification = match normalize(&raw) {
        Ok(n) => n,
        Err(e) => {
            warn!(%e, "rejecting callback");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let outcome = reconcile(st.store.as_ref(), &notification, &st.engine).await;
    match &outcome {
        ReconcileOutcome::MatchedUpdated { .. }
        | ReconcileOutcome::NotificationIndicatesFailure { .. } => {
            info!(%outcome, checkout_request_id = %notification.checkout_request_id, "reconciled");
        }
        ReconcileOutcome::MatchedButPhoneMismatch { .. } | ReconcileOutcome::NoCandidateFound => {
            warn!(%outcome, checkout_request_id = %notification.checkout_request_id, "reconciled");
        }
        ReconcileOutcome::StoreError { .. } => {
            // Dropped here; the gateway's redelivery provides the retry.
            error!(%outcome, checkout_request_id = %notification.checkout_request_id, "reconciliation failed");
        }
    }

    (StatusCode::OK, Json(CallbackAck::received())).into_response()
}
