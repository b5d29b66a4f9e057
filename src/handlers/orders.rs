use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;

use crate::domain::order::BillingAddress;
use crate::domain::{Basket, Order};
use crate::error::AppError;
use crate::paypal::{checkout_fields, is_basket_valid};
use crate::AppState;

pub async fn get_order(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let order = state
        .service
        .order(&reference)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", reference)))?;

    Ok(Json(order))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = state.service.transactions(&reference).await?;
    Ok(Json(transactions))
}

/// Hidden fields for the PayPal redirect form of an order.
pub async fn checkout(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let order = state
        .service
        .order(&reference)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", reference)))?;

    if order.is_validated() {
        return Err(AppError::BadRequest(format!(
            "Order {} is already paid",
            reference
        )));
    }

    let fields = checkout_fields(&state.paypal, &state.verifier, &order);
    Ok(Json(fields))
}

#[derive(Debug, Deserialize)]
pub struct CreateOrder {
    pub reference: String,
    pub billing: BillingAddress,
    pub currency: String,
    pub total: BigDecimal,
    /// Basket being paid for. When present it must be payable through PayPal.
    #[serde(default)]
    pub basket: Option<Basket>,
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrder>,
) -> Result<impl IntoResponse, AppError> {
    if payload.reference.trim().is_empty() {
        return Err(AppError::BadRequest("reference must not be empty".to_string()));
    }
    if payload.total <= BigDecimal::from(0) {
        return Err(AppError::BadRequest("total must be positive".to_string()));
    }
    if let Some(basket) = &payload.basket {
        if !is_basket_valid(basket) {
            return Err(AppError::BadRequest(
                "basket is empty or holds a recurring-payment product".to_string(),
            ));
        }
    }

    let order = Order::new(
        payload.reference,
        payload.billing,
        payload.currency,
        payload.total,
    );
    let order = state.service.register_order(order).await?;

    Ok((StatusCode::CREATED, Json(order)))
}
