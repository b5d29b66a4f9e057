pub mod notification_service;
pub mod order_locks;
pub mod reconciler;

pub use notification_service::{NotificationError, NotificationService, ProcessedNotification};
pub use order_locks::OrderLocks;
pub use reconciler::{classify, handle_error, NotificationReconciler, Reconciliation};
