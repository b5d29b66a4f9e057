//! Order aggregate as seen by the payment integration.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Validated,
    Cancelled,
    Error,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Validated => "VALIDATED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "VALIDATED" => Ok(OrderStatus::Validated),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            "ERROR" => Ok(OrderStatus::Error),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

/// Billing details used to prefill the PayPal checkout page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingAddress {
    pub name: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub postcode: String,
    pub country_code: String,
}

/// The purchasable aggregate a notification settles.
///
/// `status` and `payment_status` are optional because an order placed but never
/// touched by a payment callback has neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub reference: String,
    pub billing: BillingAddress,
    pub currency: String,
    pub total: BigDecimal,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<OrderStatus>,
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        reference: String,
        billing: BillingAddress,
        currency: String,
        total: BigDecimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            reference,
            billing,
            currency,
            total,
            status: None,
            payment_status: None,
            validated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_validated(&self) -> bool {
        self.status == Some(OrderStatus::Validated)
    }
}
