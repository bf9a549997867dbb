use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Result};
use pesa_schemas::{Notification, PaymentStatus};
use uuid::Uuid;

use crate::store::OrderStore;

/// Engine tuning. `store_timeout` bounds every individual store call; an
/// elapsed timeout becomes a `StoreError` outcome, never a hang.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub store_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
        }
    }
}

/// Result of one reconciliation attempt. None of these propagate as faults:
/// the delivery channel acknowledges the gateway with 200 for every
/// well-formed callback and the outcome is logged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Exactly one pending order matched amount + phone suffix and was
    /// transitioned pending→paid with the gateway receipt.
    MatchedUpdated { order_id: Uuid, receipt: String },
    /// At least one pending order matched the amount but none contained the
    /// phone-suffix key. All candidates are left pending: an unverifiable
    /// match must never mark an unrelated order paid.
    MatchedButPhoneMismatch { candidates: usize },
    /// No pending order matched the amount, or the chosen candidate was
    /// concurrently moved out of pending before the update committed.
    NoCandidateFound,
    /// The gateway reported a non-zero result code. No store mutation: with
    /// no reliable correlation there is no safe way to mark a specific order
    /// failed.
    NotificationIndicatesFailure { code: i64, desc: String },
    /// A store read/write failed or timed out. Order state untouched; the
    /// gateway's redelivery provides the eventual retry.
    StoreError { detail: String },
}

impl std::fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileOutcome::MatchedUpdated { order_id, receipt } => {
                write!(f, "matched order {order_id}, paid with receipt {receipt}")
            }
            ReconcileOutcome::MatchedButPhoneMismatch { candidates } => write!(
                f,
                "{candidates} pending order(s) matched amount but none matched phone suffix"
            ),
            ReconcileOutcome::NoCandidateFound => write!(f, "no matching pending order"),
            ReconcileOutcome::NotificationIndicatesFailure { code, desc } => {
                write!(f, "gateway reported failure code {code}: {desc}")
            }
            ReconcileOutcome::StoreError { detail } => write!(f, "store error: {detail}"),
        }
    }
}

/// Last 9 characters of the callback phone number. Strips country-code
/// variability between storage formats: the gateway sends "254702322277",
/// the order may hold "0702322277"; both end in the same 9 digits.
pub fn phone_suffix_key(phone: &str) -> &str {
    match phone.char_indices().rev().nth(8) {
        Some((i, _)) => &phone[i..],
        None => phone,
    }
}

/// Reconcile one notification against the store.
///
/// Success path: derive the phone-suffix key, fetch pending orders matching
/// the amount (newest first), scan the whole candidate set for the first
/// phone-suffix containment hit, then apply a conditional point update by
/// order id. The update is a compare-and-swap on `pending`; zero rows
/// affected means a concurrent callback won the race and this attempt
/// reports [`ReconcileOutcome::NoCandidateFound`] without mutating anything.
///
/// Failure-code notifications short-circuit before any store access.
pub async fn reconcile(
    store: &dyn OrderStore,
    notification: &Notification,
    cfg: &EngineConfig,
) -> ReconcileOutcome {
    if !notification.is_success() {
        return ReconcileOutcome::NotificationIndicatesFailure {
            code: notification.result_code,
            desc: notification.result_desc.clone(),
        };
    }

    // normalize() always attaches payment details on success; a hand-built
    // notification without them has nothing to match on.
    let Some(payment) = notification.payment.as_ref() else {
        return ReconcileOutcome::NoCandidateFound;
    };

    let key = phone_suffix_key(&payment.phone);

    let candidates = match bounded(cfg, store.find_pending_by_amount(payment.amount)).await {
        Ok(c) => c,
        Err(e) => {
            return ReconcileOutcome::StoreError {
                detail: format!("candidate query failed: {e:#}"),
            }
        }
    };

    if candidates.is_empty() {
        return ReconcileOutcome::NoCandidateFound;
    }

    // Scan the full candidate set rather than trusting the store's top-1:
    // two pending orders may share an amount and only the phone suffix
    // disambiguates them.
    let Some(order) = candidates.iter().find(|o| o.phone_number.contains(key)) else {
        return ReconcileOutcome::MatchedButPhoneMismatch {
            candidates: candidates.len(),
        };
    };

    let rows = match bounded(
        cfg,
        store.update_if_pending(order.id, PaymentStatus::Paid, Some(&payment.receipt)),
    )
    .await
    {
        Ok(n) => n,
        Err(e) => {
            return ReconcileOutcome::StoreError {
                detail: format!("conditional update failed: {e:#}"),
            }
        }
    };

    if rows == 0 {
        // Lost the race: the order left pending between query and write.
        return ReconcileOutcome::NoCandidateFound;
    }

    ReconcileOutcome::MatchedUpdated {
        order_id: order.id,
        receipt: payment.receipt.clone(),
    }
}

async fn bounded<T>(cfg: &EngineConfig, fut: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(cfg.store_timeout, fut).await {
        Ok(res) => res,
        Err(_) => Err(anyhow!(
            "store call exceeded {}ms",
            cfg.store_timeout.as_millis()
        )),
    }
}
