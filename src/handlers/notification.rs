use axum::{extract::State, http::StatusCode};
use tracing::debug;

use crate::domain::Notification;
use crate::error::AppError;
use crate::AppState;

/// PayPal IPN receiver.
///
/// PayPal keeps redelivering until it gets a 200, so every notification that
/// was recorded, including rejected ones, is acknowledged with an empty 200.
/// Only a failed confirmation round-trip or a storage failure answers
/// otherwise.
pub async fn ipn(State(state): State<AppState>, body: String) -> Result<StatusCode, AppError> {
    let notification = Notification::from_urlencoded(&body);
    if notification.is_empty() {
        return Err(AppError::BadRequest("empty notification".to_string()));
    }

    let processed = state.service.process(notification).await?;

    debug!(
        transaction_id = %processed.transaction.id,
        state = ?processed.transaction.state,
        status_code = ?processed.transaction.status_code,
        rejection = ?processed.rejection,
        "notification acknowledged"
    );

    Ok(StatusCode::OK)
}
