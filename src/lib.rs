pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod paypal;
pub mod ports;
pub mod services;

use axum::{Router, routing::{get, post}};
use std::sync::Arc;

use crate::paypal::{PaypalClient, PaypalSettings, UrlCheckVerifier};
use crate::ports::PaymentStore;
use crate::services::{NotificationReconciler, NotificationService};

#[derive(Clone)]
pub struct AppState {
    pub service: NotificationService,
    pub paypal: PaypalSettings,
    pub paypal_client: PaypalClient,
    pub verifier: UrlCheckVerifier,
}

impl AppState {
    /// Wires the PayPal collaborators around the given store.
    pub fn new(
        paypal: PaypalSettings,
        paypal_client: PaypalClient,
        store: Arc<dyn PaymentStore>,
    ) -> Self {
        let verifier = UrlCheckVerifier::new(paypal.check_secret.clone());
        let reconciler = NotificationReconciler::new(
            Arc::new(verifier.clone()),
            Arc::new(paypal_client.clone()),
        );
        let service = NotificationService::new(reconciler, store);

        Self {
            service,
            paypal,
            paypal_client,
            verifier,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/paypal/ipn", post(handlers::notification::ipn))
        .route("/orders", post(handlers::orders::create_order))
        .route("/orders/:reference", get(handlers::orders::get_order))
        .route(
            "/orders/:reference/transactions",
            get(handlers::orders::list_transactions),
        )
        .route("/orders/:reference/checkout", get(handlers::orders::checkout))
        .with_state(state)
}
