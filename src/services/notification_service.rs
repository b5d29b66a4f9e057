//! Host-side orchestration around the reconciler: lookup, locking, persistence.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{Notification, Order, Rejection, Transaction, TransactionState, TransactionStatus};
use crate::ports::{
    ConfirmationError, OrderRepository, PaymentStore, ReconciliationUnit, RepositoryError,
    TransactionRepository,
};
use crate::services::order_locks::OrderLocks;
use crate::services::reconciler::{handle_error, NotificationReconciler};

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification does not name an order")]
    MissingOrderReference,
    #[error("Confirmation failed: {0}")]
    Confirmation(#[from] ConfirmationError),
    #[error("Storage failed: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Order {0} already exists")]
    DuplicateOrder(String),
}

/// Result of handling one notification.
#[derive(Debug)]
pub struct ProcessedNotification {
    pub transaction: Transaction,
    /// `None` when the notification named an unknown order.
    pub order: Option<Order>,
    pub rejection: Option<Rejection>,
}

#[derive(Clone)]
pub struct NotificationService {
    reconciler: NotificationReconciler,
    store: Arc<dyn PaymentStore>,
    locks: OrderLocks,
}

impl NotificationService {
    pub fn new(reconciler: NotificationReconciler, store: Arc<dyn PaymentStore>) -> Self {
        Self {
            reconciler,
            store,
            locks: OrderLocks::new(),
        }
    }

    /// Reconciles, confirms and persists one notification.
    ///
    /// The order update and the transaction are committed together. A
    /// confirmation transport failure is returned before anything is written,
    /// so the counterparty may safely redeliver.
    pub async fn process(
        &self,
        notification: Notification,
    ) -> Result<ProcessedNotification, NotificationError> {
        let reference = notification
            .order_reference()
            .ok_or(NotificationError::MissingOrderReference)?
            .to_string();

        let _guard = self.locks.acquire(&reference).await;
        let unit = self.store.begin(&reference).await?;
        debug!(order_reference = %reference, "processing payment notification");

        let Some(loaded) = unit.order().cloned() else {
            let mut transaction = Transaction::new(reference, notification);
            transaction.mark(TransactionState::Ko, TransactionStatus::OrderUnknown);
            handle_error(&mut transaction, None);
            let transaction = unit.commit(None, &transaction).await?;
            return Ok(ProcessedNotification {
                transaction,
                order: None,
                rejection: None,
            });
        };

        let mut order = loaded.clone();
        let reconciliation = self.reconciler.reconcile(notification, &mut order);
        let needs_confirmation = reconciliation.needs_confirmation();
        let mut rejection = reconciliation.rejection;
        let mut transaction = reconciliation.transaction;

        if needs_confirmation {
            rejection = self.reconciler.confirm(&mut transaction, &mut order).await?;
        }

        if let Some(rejection) = &rejection {
            warn!(order_reference = %order.reference, ?rejection, "payment notification rejected");
        }

        let changed = order != loaded;
        if changed {
            order.updated_at = Utc::now();
        }
        let transaction = unit
            .commit(changed.then_some(&order), &transaction)
            .await?;

        info!(
            order_reference = %order.reference,
            transaction_id = %transaction.id,
            status_code = ?transaction.status_code,
            "payment notification reconciled"
        );

        Ok(ProcessedNotification {
            transaction,
            order: Some(order),
            rejection,
        })
    }

    /// Registers an order so later notifications can be reconciled against it.
    pub async fn register_order(&self, order: Order) -> Result<Order, NotificationError> {
        let _guard = self.locks.acquire(&order.reference).await;
        if self.store.get_by_reference(&order.reference).await?.is_some() {
            return Err(NotificationError::DuplicateOrder(order.reference));
        }
        self.store.save(&order).await?;
        info!(order_reference = %order.reference, "order registered");
        Ok(order)
    }

    pub async fn order(&self, reference: &str) -> Result<Option<Order>, RepositoryError> {
        self.store.get_by_reference(reference).await
    }

    pub async fn transactions(&self, reference: &str) -> Result<Vec<Transaction>, RepositoryError> {
        self.store.list_for_order(reference).await
    }
}
