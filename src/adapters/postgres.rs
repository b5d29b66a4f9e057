//! Postgres implementations of the order and transaction repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgExecutor, Postgres};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::domain::order::BillingAddress;
use crate::domain::{Notification, Order, Transaction};
use crate::ports::{
    OrderRepository, PaymentStore, ReconciliationUnit, RepositoryError, RepositoryResult,
    TransactionRepository,
};

/// Postgres-backed repository for both aggregates.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PostgresRepository {
    async fn get_by_reference(&self, reference: &str) -> RepositoryResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE reference = $1")
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_domain()).transpose()
    }

    async fn save(&self, order: &Order) -> RepositoryResult<()> {
        upsert_order(&self.pool, order).await
    }
}

#[async_trait]
impl TransactionRepository for PostgresRepository {
    async fn insert(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        insert_transaction(&self.pool, tx).await
    }

    async fn list_for_order(&self, order_reference: &str) -> RepositoryResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM payment_transactions WHERE order_reference = $1 ORDER BY created_at ASC",
        )
        .bind(order_reference)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_domain()).collect()
    }
}

#[async_trait]
impl PaymentStore for PostgresRepository {
    /// Opens a database transaction and locks the order row with
    /// `SELECT ... FOR UPDATE`, so instances sharing the database serialise on
    /// the same order. The connection stays checked out until commit or drop.
    async fn begin(&self, reference: &str) -> RepositoryResult<Box<dyn ReconciliationUnit>> {
        let mut db_tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders WHERE reference = $1 FOR UPDATE",
        )
        .bind(reference)
        .fetch_optional(&mut *db_tx)
        .await?;
        let order = row.map(|r| r.into_domain()).transpose()?;

        debug!(order_reference = %reference, found = order.is_some(), "order row locked");

        Ok(Box::new(PostgresUnit { db_tx, order }))
    }
}

/// Holds the row lock taken in `begin`. Dropping it rolls the transaction back.
struct PostgresUnit {
    db_tx: sqlx::Transaction<'static, Postgres>,
    order: Option<Order>,
}

#[async_trait]
impl ReconciliationUnit for PostgresUnit {
    fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    async fn commit(
        self: Box<Self>,
        order: Option<&Order>,
        tx: &Transaction,
    ) -> RepositoryResult<Transaction> {
        let mut db_tx = self.db_tx;

        if let Some(order) = order {
            upsert_order(&mut *db_tx, order).await?;
        }
        let saved = insert_transaction(&mut *db_tx, tx).await?;
        db_tx.commit().await?;

        Ok(saved)
    }
}

async fn upsert_order<'e, E>(executor: E, order: &Order) -> RepositoryResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO orders (
            reference, billing_name, billing_address1, billing_address2, billing_city,
            billing_postcode, billing_country_code, currency, total, status,
            payment_status, validated_at, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        ON CONFLICT (reference) DO UPDATE SET
            status = EXCLUDED.status,
            payment_status = EXCLUDED.payment_status,
            validated_at = EXCLUDED.validated_at,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(&order.reference)
    .bind(&order.billing.name)
    .bind(&order.billing.address1)
    .bind(&order.billing.address2)
    .bind(&order.billing.city)
    .bind(&order.billing.postcode)
    .bind(&order.billing.country_code)
    .bind(&order.currency)
    .bind(&order.total)
    .bind(order.status.map(|s| s.as_str()))
    .bind(order.payment_status.map(|s| s.as_str()))
    .bind(order.validated_at)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

async fn insert_transaction<'e, E>(executor: E, tx: &Transaction) -> RepositoryResult<Transaction>
where
    E: PgExecutor<'e>,
{
    let parameters = serde_json::to_value(&tx.parameters)
        .map_err(|e| RepositoryError::Corrupt(e.to_string()))?;

    let row = sqlx::query_as::<_, TransactionRow>(
        r#"
        INSERT INTO payment_transactions (
            id, order_reference, parameters, state, status_code, created_at, validated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, order_reference, parameters, state, status_code, created_at, validated_at
        "#,
    )
    .bind(tx.id)
    .bind(&tx.order_reference)
    .bind(parameters)
    .bind(tx.state.map(|s| s.as_str()))
    .bind(tx.status_code.map(|s| s.as_str()))
    .bind(tx.created_at)
    .bind(tx.validated_at)
    .fetch_one(executor)
    .await?;

    row.into_domain()
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    reference: String,
    billing_name: String,
    billing_address1: String,
    billing_address2: Option<String>,
    billing_city: String,
    billing_postcode: String,
    billing_country_code: String,
    currency: String,
    total: bigdecimal::BigDecimal,
    status: Option<String>,
    payment_status: Option<String>,
    validated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_domain(self) -> RepositoryResult<Order> {
        Ok(Order {
            reference: self.reference,
            billing: BillingAddress {
                name: self.billing_name,
                address1: self.billing_address1,
                address2: self.billing_address2,
                city: self.billing_city,
                postcode: self.billing_postcode,
                country_code: self.billing_country_code,
            },
            currency: self.currency,
            total: self.total,
            status: parse_column(self.status)?,
            payment_status: parse_column(self.payment_status)?,
            validated_at: self.validated_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    order_reference: String,
    parameters: serde_json::Value,
    state: Option<String>,
    status_code: Option<String>,
    created_at: DateTime<Utc>,
    validated_at: Option<DateTime<Utc>>,
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<Transaction> {
        let parameters: Notification = serde_json::from_value(self.parameters)
            .map_err(|e| RepositoryError::Corrupt(format!("transaction {}: {}", self.id, e)))?;

        Ok(Transaction {
            id: self.id,
            order_reference: self.order_reference,
            parameters,
            state: parse_column(self.state)?,
            status_code: parse_column(self.status_code)?,
            created_at: self.created_at,
            validated_at: self.validated_at,
        })
    }
}

fn parse_column<T>(value: Option<String>) -> RepositoryResult<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .map(|v| v.parse::<T>().map_err(RepositoryError::Corrupt))
        .transpose()
}
