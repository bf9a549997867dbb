//! Shared runtime state for pesa-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The store handle is
//! built once at process start and injected here; handlers never construct
//! their own connections.

use std::sync::Arc;

use pesa_reconcile::{EngineConfig, OrderStore};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in the health response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Static build metadata.
    pub build: BuildInfo,
    /// Injected order store; Postgres in production, in-memory in tests.
    pub store: Arc<dyn OrderStore>,
    /// Engine tuning (store timeout).
    pub engine: EngineConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn OrderStore>, engine: EngineConfig) -> Self {
        Self {
            build: BuildInfo {
                service: "pesa-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            store,
            engine,
        }
    }
}
