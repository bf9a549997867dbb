//! Request and response types for the pesa-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests. No business logic lives here.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// /api/callback
// ---------------------------------------------------------------------------

/// Acknowledgment returned for every well-formed callback, whatever the
/// reconciliation outcome: the gateway must never see business-logic failure
/// as a transport failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackAck {
    pub result: &'static str,
}

impl CallbackAck {
    pub fn received() -> Self {
        Self { result: "received" }
    }
}
