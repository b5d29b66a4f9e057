//! Domain entities for PayPal payment reconciliation.
//! Framework-agnostic: nothing in here knows about HTTP or SQL.

pub mod basket;
pub mod notification;
pub mod order;
pub mod pending_reason;
pub mod transaction;

pub use basket::{Basket, BasketElement, Product};
pub use notification::Notification;
pub use order::{Order, OrderStatus};
pub use pending_reason::PendingReason;
pub use transaction::{Rejection, Transaction, TransactionState, TransactionStatus};
