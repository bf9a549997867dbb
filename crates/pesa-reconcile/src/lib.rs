//! pesa-reconcile
//!
//! The reconciliation core:
//! - `normalize` turns a raw gateway callback into a canonical `Notification`
//!   or rejects it as malformed before any store interaction.
//! - `reconcile` matches a success notification to at most one pending order
//!   (amount equality + phone-suffix containment) and applies a single
//!   conditional pending→paid transition.
//!
//! The store is an injected port (`OrderStore`); concrete backends live in
//! pesa-store (Postgres) and pesa-testkit (in-memory).

mod engine;
mod normalize;
mod store;

pub use engine::{phone_suffix_key, reconcile, EngineConfig, ReconcileOutcome};
pub use normalize::{normalize, MalformedPayload};
pub use store::OrderStore;
