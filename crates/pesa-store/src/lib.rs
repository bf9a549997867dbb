//! Postgres-backed [`OrderStore`] plus connection, migration, and status
//! plumbing. The pool is built once at process start and handed to the
//! daemon by reference (no module-level singleton).

use anyhow::{Context, Result};
use async_trait::async_trait;
use pesa_reconcile::OrderStore;
use pesa_schemas::{Order, PaymentStatus};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use uuid::Uuid;

pub const ENV_DB_URL: &str = "PESA_DATABASE_URL";

/// Connect to Postgres using PESA_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url =
        std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;
    let ok = one == 1;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='orders'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok,
        has_orders_table: exists,
    })
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_orders_table: bool,
}

// ---------------------------------------------------------------------------
// PgOrderStore
// ---------------------------------------------------------------------------

/// [`OrderStore`] over a shared Postgres pool.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn find_pending_by_amount(&self, amount: Decimal) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            select id, total_amount, phone_number, payment_status, mpesa_receipt, created_at
            from orders
            where payment_status = 'pending'
              and total_amount = $1
            order by created_at desc
            "#,
        )
        .bind(amount)
        .fetch_all(&self.pool)
        .await
        .context("find_pending_by_amount failed")?;

        rows.iter().map(order_from_row).collect()
    }

    async fn update_if_pending(
        &self,
        order_id: Uuid,
        status: PaymentStatus,
        receipt: Option<&str>,
    ) -> Result<u64> {
        // Compare-and-swap on 'pending': a concurrent callback that already
        // moved the order to a terminal status observes zero rows affected.
        // coalesce keeps an existing receipt when none is supplied.
        let res = sqlx::query(
            r#"
            update orders
            set payment_status = $2,
                mpesa_receipt = coalesce($3, mpesa_receipt)
            where id = $1
              and payment_status = 'pending'
            "#,
        )
        .bind(order_id)
        .bind(status.as_str())
        .bind(receipt)
        .execute(&self.pool)
        .await
        .context("update_if_pending failed")?;

        Ok(res.rows_affected())
    }
}

fn order_from_row(row: &PgRow) -> Result<Order> {
    Ok(Order {
        id: row.try_get("id")?,
        total_amount: row.try_get("total_amount")?,
        phone_number: row.try_get("phone_number")?,
        payment_status: PaymentStatus::parse(&row.try_get::<String, _>("payment_status")?)?,
        mpesa_receipt: row.try_get("mpesa_receipt")?,
        created_at: row.try_get("created_at")?,
    })
}

// ---------------------------------------------------------------------------
// Ops helpers
// ---------------------------------------------------------------------------

/// Seed a pending order (ops/testing aid; production orders come from the
/// initiation flow).
pub async fn insert_order(pool: &PgPool, order: &NewOrder) -> Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as::<_, (Uuid,)>(
        r#"
        insert into orders (total_amount, phone_number)
        values ($1, $2)
        returning id
        "#,
    )
    .bind(order.total_amount)
    .bind(&order.phone_number)
    .fetch_one(pool)
    .await
    .context("insert_order failed")?;

    Ok(id)
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub total_amount: Decimal,
    pub phone_number: String,
}

pub async fn fetch_order(pool: &PgPool, order_id: Uuid) -> Result<Order> {
    let row = sqlx::query(
        r#"
        select id, total_amount, phone_number, payment_status, mpesa_receipt, created_at
        from orders
        where id = $1
        "#,
    )
    .bind(order_id)
    .fetch_one(pool)
    .await
    .context("fetch_order failed")?;

    order_from_row(&row)
}
