//! Collaborator seams of the reconciler.
//! Concrete implementations live in `adapters` and `paypal`.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Notification, Order, Transaction};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Failure of the confirmation round-trip itself. No terminal transaction state
/// exists for these, so they propagate to the caller.
#[derive(Error, Debug)]
pub enum ConfirmationError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Invalid response from PayPal: {0}")]
    InvalidResponse(String),
    #[error("Circuit breaker open: {0}")]
    CircuitBreakerOpen(String),
}

/// Decides whether a notification genuinely comes from the counterparty.
pub trait NotificationVerifier: Send + Sync {
    fn is_valid(&self, notification: &Notification, order: &Order) -> bool;
}

/// Re-posts a notification to the counterparty and returns the raw reply body.
#[async_trait]
pub trait ConfirmationClient: Send + Sync {
    async fn confirm(&self, notification: &Notification) -> Result<String, ConfirmationError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn get_by_reference(&self, reference: &str) -> RepositoryResult<Option<Order>>;
    async fn save(&self, order: &Order) -> RepositoryResult<()>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn insert(&self, tx: &Transaction) -> RepositoryResult<Transaction>;
    async fn list_for_order(&self, order_reference: &str) -> RepositoryResult<Vec<Transaction>>;
}

/// One notification's worth of work against a single order.
///
/// The store keeps the order locked from `begin` until the unit is committed
/// or dropped. Dropping without commit discards every write.
#[async_trait]
pub trait ReconciliationUnit: Send {
    /// The order as loaded under the lock, `None` if no such order exists.
    fn order(&self) -> Option<&Order>;

    /// Writes `order` (when given) and `tx` as a single atomic change.
    async fn commit(
        self: Box<Self>,
        order: Option<&Order>,
        tx: &Transaction,
    ) -> RepositoryResult<Transaction>;
}

/// Storage for orders and their transactions with per-order units of work.
#[async_trait]
pub trait PaymentStore: OrderRepository + TransactionRepository {
    async fn begin(&self, reference: &str) -> RepositoryResult<Box<dyn ReconciliationUnit>>;
}
