use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use pesa_reconcile::OrderStore;
use pesa_schemas::{Order, PaymentStatus};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Thread-safe in-memory [`OrderStore`] for tests.
///
/// Honors the same contract as the Postgres store: candidate queries return
/// pending orders with an exactly equal amount, newest first, and updates
/// are conditional on the order still being pending.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<Uuid, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pending order and return its id.
    pub async fn seed_pending(&self, amount: Decimal, phone: &str) -> Uuid {
        self.seed_pending_at(amount, phone, Utc::now()).await
    }

    /// Insert a pending order with an explicit creation time, for scenarios
    /// that depend on newest-first candidate ordering.
    pub async fn seed_pending_at(
        &self,
        amount: Decimal,
        phone: &str,
        created_at: chrono::DateTime<Utc>,
    ) -> Uuid {
        let order = Order {
            id: Uuid::new_v4(),
            total_amount: amount,
            phone_number: phone.to_string(),
            payment_status: PaymentStatus::Pending,
            mpesa_receipt: None,
            created_at,
        };
        let id = order.id;
        self.orders.write().await.insert(id, order);
        id
    }

    pub async fn get(&self, order_id: Uuid) -> Option<Order> {
        self.orders.read().await.get(&order_id).cloned()
    }

    /// Force a status, bypassing the pending guard. Used to simulate a
    /// concurrent reconciliation winning the race between query and update.
    pub async fn force_status(&self, order_id: Uuid, status: PaymentStatus) {
        if let Some(order) = self.orders.write().await.get_mut(&order_id) {
            order.payment_status = status;
        }
    }

    pub async fn count_with_status(&self, status: PaymentStatus) -> usize {
        self.orders
            .read()
            .await
            .values()
            .filter(|o| o.payment_status == status)
            .count()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find_pending_by_amount(&self, amount: Decimal) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut hits: Vec<Order> = orders
            .values()
            .filter(|o| o.payment_status == PaymentStatus::Pending && o.total_amount == amount)
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(hits)
    }

    async fn update_if_pending(
        &self,
        order_id: Uuid,
        status: PaymentStatus,
        receipt: Option<&str>,
    ) -> Result<u64> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order_id) {
            Some(order) if order.payment_status == PaymentStatus::Pending => {
                order.payment_status = status;
                if let Some(r) = receipt {
                    order.mpesa_receipt = Some(r.to_string());
                }
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

/// Store whose every call errors, for exercising the `StoreError` path.
#[derive(Default, Clone, Copy)]
pub struct FailingOrderStore;

#[async_trait]
impl OrderStore for FailingOrderStore {
    async fn find_pending_by_amount(&self, _amount: Decimal) -> Result<Vec<Order>> {
        Err(anyhow!("connection refused"))
    }

    async fn update_if_pending(
        &self,
        _order_id: Uuid,
        _status: PaymentStatus,
        _receipt: Option<&str>,
    ) -> Result<u64> {
        Err(anyhow!("connection refused"))
    }
}
