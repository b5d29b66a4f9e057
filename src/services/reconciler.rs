//! Turns an untrusted PayPal notification into transaction and order state.

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

use crate::domain::{
    Notification, Order, OrderStatus, PendingReason, Rejection, Transaction, TransactionState,
    TransactionStatus,
};
use crate::ports::{ConfirmationClient, ConfirmationError, NotificationVerifier};

/// Exact reply PayPal sends when it recognises a re-posted notification.
pub const VERIFIED: &str = "VERIFIED";

#[derive(Debug)]
pub struct Reconciliation {
    pub transaction: Transaction,
    pub rejection: Option<Rejection>,
}

impl Reconciliation {
    /// Only a `Completed` payment that passed every check goes on to the
    /// confirmation round-trip.
    pub fn needs_confirmation(&self) -> bool {
        self.transaction.is_ok()
            && self.transaction.status_code == Some(TransactionStatus::Validated)
    }
}

/// Maps a `payment_status` value onto a classification. Matching is exact and
/// case-sensitive.
pub fn classify(payment_status: Option<&str>) -> (TransactionState, TransactionStatus) {
    match payment_status {
        Some("Pending") => (TransactionState::Ok, TransactionStatus::Pending),
        Some("Completed") => (TransactionState::Ok, TransactionStatus::Validated),
        Some("Cancelled") => (TransactionState::Ok, TransactionStatus::Cancelled),
        _ => (TransactionState::Ko, TransactionStatus::Unknown),
    }
}

/// Applies the business consequence of a non-validating classification.
///
/// Always leaves the transaction `KO`, including for pending and cancelled
/// payments that were classified `OK`. `order` is `None` when the notification
/// named an order that does not exist.
pub fn handle_error(transaction: &mut Transaction, mut order: Option<&mut Order>) {
    let reference = transaction.order_reference.clone();

    match transaction.status_code {
        Some(TransactionStatus::OrderUnknown) => {
            error!(order_reference = %reference, "payment notification for an unknown order");
        }
        Some(TransactionStatus::ErrorValidation) => {
            error!(
                order_reference = %reference,
                "PayPal rejected the postback validation"
            );
        }
        Some(TransactionStatus::Cancelled) => {
            if let Some(order) = order.as_deref_mut() {
                order.status = Some(OrderStatus::Cancelled);
            }
            error!(
                order_reference = %reference,
                "order cancelled by payment notification, see transaction parameters"
            );
        }
        Some(TransactionStatus::Pending) => {
            if let Some(order) = order.as_deref_mut() {
                order.status = Some(OrderStatus::Pending);
            }
            let code = transaction.parameters.pending_reason();
            let reason = PendingReason::from_code(code);
            error!(
                order_reference = %reference,
                pending_reason = code.unwrap_or_default(),
                reason = reason.description(),
                "payment pending"
            );
        }
        other => {
            error!(
                order_reference = %reference,
                status_code = ?other,
                "uncaught payment notification status"
            );
        }
    }

    transaction.state = Some(TransactionState::Ko);

    if let Some(order) = order {
        if order.status.is_none() {
            order.status = Some(OrderStatus::Cancelled);
        }
    }

    if transaction.status_code.is_none() {
        transaction.status_code = Some(TransactionStatus::Unknown);
    }
}

/// The notification reconciler. Callers must serialise calls per order; see
/// `OrderLocks`.
#[derive(Clone)]
pub struct NotificationReconciler {
    verifier: Arc<dyn NotificationVerifier>,
    confirmation: Arc<dyn ConfirmationClient>,
}

impl NotificationReconciler {
    pub fn new(
        verifier: Arc<dyn NotificationVerifier>,
        confirmation: Arc<dyn ConfirmationClient>,
    ) -> Self {
        Self {
            verifier,
            confirmation,
        }
    }

    /// Creates the transaction for `notification` and classifies it against
    /// `order`, applying error handling for everything except a `Completed`
    /// payment.
    pub fn reconcile(&self, notification: Notification, order: &mut Order) -> Reconciliation {
        let mut transaction = Transaction::new(order.reference.clone(), notification);

        if !self.verifier.is_valid(&transaction.parameters, order) {
            transaction.mark(TransactionState::Ko, TransactionStatus::WrongCallback);
            error!(
                order_reference = %order.reference,
                "payment notification failed the authenticity check"
            );
            return Reconciliation {
                transaction,
                rejection: Some(Rejection::AuthenticityFailure),
            };
        }

        if order.is_validated() {
            transaction.mark(TransactionState::Ko, TransactionStatus::WrongCallback);
            error!(
                order_reference = %order.reference,
                "payment notification for an already validated order"
            );
            return Reconciliation {
                transaction,
                rejection: Some(Rejection::ReplayFailure),
            };
        }

        let (state, status_code) = classify(transaction.parameters.payment_status());
        transaction.mark(state, status_code);

        let rejection = match state {
            TransactionState::Ko => Some(Rejection::UnrecognizedStatus {
                payment_status: transaction.parameters.payment_status().map(str::to_string),
            }),
            TransactionState::Ok => None,
        };

        if status_code != TransactionStatus::Validated {
            handle_error(&mut transaction, Some(order));
        }

        Reconciliation {
            transaction,
            rejection,
        }
    }

    /// Confirmation round-trip. Does nothing unless the transaction is `OK`.
    ///
    /// On transport failure the error is returned and neither the transaction
    /// nor the order is touched.
    pub async fn confirm(
        &self,
        transaction: &mut Transaction,
        order: &mut Order,
    ) -> Result<Option<Rejection>, ConfirmationError> {
        if !transaction.is_ok() {
            return Ok(None);
        }

        let response = self.confirmation.confirm(&transaction.parameters).await?;

        if response == VERIFIED {
            let now = Utc::now();
            transaction.mark(TransactionState::Ok, TransactionStatus::Validated);
            transaction.validated_at = Some(now);

            order.validated_at = Some(now);
            order.status = Some(OrderStatus::Validated);
            order.payment_status = Some(OrderStatus::Validated);

            info!(order_reference = %order.reference, "payment confirmed by PayPal");
            Ok(None)
        } else {
            transaction.mark(TransactionState::Ko, TransactionStatus::ErrorValidation);
            order.payment_status = Some(OrderStatus::Error);

            error!(
                order_reference = %order.reference,
                "PayPal failed to check the postback"
            );
            Ok(Some(Rejection::ConfirmationMismatch { response }))
        }
    }
}
