use anyhow::Result;
use async_trait::async_trait;
use pesa_schemas::{Order, PaymentStatus};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Store port consumed by the reconciliation engine.
///
/// Constructed once at process start and passed by reference into the engine
/// so tests can substitute an in-memory fake (pesa-testkit).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Pending orders whose total amount exactly equals `amount`,
    /// newest first.
    async fn find_pending_by_amount(&self, amount: Decimal) -> Result<Vec<Order>>;

    /// Conditional point update: apply `status` (and receipt, if any) only if
    /// the order is still pending at write time. Returns rows affected —
    /// 0 means a concurrent reconciliation already moved the order to a
    /// terminal status.
    async fn update_if_pending(
        &self,
        order_id: Uuid,
        status: PaymentStatus,
        receipt: Option<&str>,
    ) -> Result<u64>;
}
