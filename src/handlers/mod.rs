pub mod notification;
pub mod orders;

use crate::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub paypal_circuit: String,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let paypal_circuit = state.paypal_client.circuit_state();

    let status_code = if paypal_circuit == "closed" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let health_response = HealthStatus {
        status: if status_code == StatusCode::OK {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        paypal_circuit,
    };

    (status_code, Json(health_response))
}
