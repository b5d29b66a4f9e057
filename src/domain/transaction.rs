//! Transaction domain entity.
//! One record per inbound payment notification, never reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::notification::Notification;

/// Whether the notification was successfully classified.
///
/// `Ok` does not mean the payment succeeded: pending and cancelled payments are
/// classified `Ok` too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionState {
    Ok,
    Ko,
}

impl TransactionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionState::Ok => "OK",
            TransactionState::Ko => "KO",
        }
    }
}

impl FromStr for TransactionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OK" => Ok(TransactionState::Ok),
            "KO" => Ok(TransactionState::Ko),
            other => Err(format!("unknown transaction state: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Unknown,
    Pending,
    Validated,
    Cancelled,
    WrongCallback,
    OrderUnknown,
    ErrorValidation,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Unknown => "UNKNOWN",
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Validated => "VALIDATED",
            TransactionStatus::Cancelled => "CANCELLED",
            TransactionStatus::WrongCallback => "WRONG_CALLBACK",
            TransactionStatus::OrderUnknown => "ORDER_UNKNOWN",
            TransactionStatus::ErrorValidation => "ERROR_VALIDATION",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNKNOWN" => Ok(TransactionStatus::Unknown),
            "PENDING" => Ok(TransactionStatus::Pending),
            "VALIDATED" => Ok(TransactionStatus::Validated),
            "CANCELLED" => Ok(TransactionStatus::Cancelled),
            "WRONG_CALLBACK" => Ok(TransactionStatus::WrongCallback),
            "ORDER_UNKNOWN" => Ok(TransactionStatus::OrderUnknown),
            "ERROR_VALIDATION" => Ok(TransactionStatus::ErrorValidation),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

/// Why a notification was turned into a KO transaction.
///
/// These are recovered locally; they are reported next to the transaction and
/// never surface as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    AuthenticityFailure,
    ReplayFailure,
    UnrecognizedStatus { payment_status: Option<String> },
    ConfirmationMismatch { response: String },
}

/// Domain entity representing one settlement attempt for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub order_reference: String,
    pub parameters: Notification,
    pub state: Option<TransactionState>,
    pub status_code: Option<TransactionStatus>,
    pub created_at: DateTime<Utc>,
    pub validated_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(order_reference: String, parameters: Notification) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_reference,
            parameters,
            state: None,
            status_code: None,
            created_at: Utc::now(),
            validated_at: None,
        }
    }

    pub fn mark(&mut self, state: TransactionState, status_code: TransactionStatus) {
        self.state = Some(state);
        self.status_code = Some(status_code);
    }

    pub fn is_ok(&self) -> bool {
        self.state == Some(TransactionState::Ok)
    }

    /// Shortcut for reading a raw notification field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters.get(key)
    }
}
