use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{Order, Transaction};
use crate::ports::{
    OrderRepository, PaymentStore, ReconciliationUnit, RepositoryResult, TransactionRepository,
};

/// A thread-safe in-memory store for orders and their transactions.
///
/// Used when no database is configured and throughout the tests. Per-order
/// exclusion only holds within one process, through the service's `OrderLocks`.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    orders: Arc<RwLock<HashMap<String, Order>>>,
    transactions: Arc<RwLock<Vec<Transaction>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn get_by_reference(&self, reference: &str) -> RepositoryResult<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(reference).cloned())
    }

    async fn save(&self, order: &Order) -> RepositoryResult<()> {
        let mut orders = self.orders.write().await;
        orders.insert(order.reference.clone(), order.clone());
        Ok(())
    }
}

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn insert(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        let mut transactions = self.transactions.write().await;
        transactions.push(tx.clone());
        Ok(tx.clone())
    }

    async fn list_for_order(&self, order_reference: &str) -> RepositoryResult<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .filter(|tx| tx.order_reference == order_reference)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn begin(&self, reference: &str) -> RepositoryResult<Box<dyn ReconciliationUnit>> {
        let order = self.get_by_reference(reference).await?;
        Ok(Box::new(MemoryUnit {
            store: self.clone(),
            order,
        }))
    }
}

struct MemoryUnit {
    store: InMemoryStore,
    order: Option<Order>,
}

#[async_trait]
impl ReconciliationUnit for MemoryUnit {
    fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    async fn commit(
        self: Box<Self>,
        order: Option<&Order>,
        tx: &Transaction,
    ) -> RepositoryResult<Transaction> {
        // both guards are taken before either map changes
        let mut orders = self.store.orders.write().await;
        let mut transactions = self.store.transactions.write().await;

        if let Some(order) = order {
            orders.insert(order.reference.clone(), order.clone());
        }
        transactions.push(tx.clone());
        Ok(tx.clone())
    }
}
