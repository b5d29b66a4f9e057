#![allow(dead_code)]

use bigdecimal::BigDecimal;
use paypal_ipn_core::adapters::InMemoryStore;
use paypal_ipn_core::domain::order::BillingAddress;
use paypal_ipn_core::domain::{Notification, Order};
use paypal_ipn_core::paypal::{PaypalClient, PaypalSettings, UrlCheckVerifier};
use paypal_ipn_core::ports::PaymentStore;
use paypal_ipn_core::AppState;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const SECRET: &str = "test-check-secret";
pub const WEBSCR: &str = "/cgi-bin/webscr";

pub fn settings(paypal_base: &str) -> PaypalSettings {
    PaypalSettings {
        code: "paypal".to_string(),
        url_action: Url::parse(&format!("{}{}", paypal_base, WEBSCR)).unwrap(),
        account: "merchant@example.com".to_string(),
        cert_id: String::new(),
        check_secret: SECRET.to_string(),
        url_callback: Url::parse("https://shop.example.com/paypal/ipn").unwrap(),
        url_return_ok: Url::parse("https://shop.example.com/ok").unwrap(),
        url_return_ko: Url::parse("https://shop.example.com/ko").unwrap(),
        debug: false,
    }
}

/// App state over `store`, talking to a mock PayPal at `paypal_base`.
pub fn app_state_with_store(paypal_base: &str, store: Arc<dyn PaymentStore>) -> AppState {
    let settings = settings(paypal_base);
    let client = PaypalClient::with_circuit_breaker(
        settings.url_action.to_string(),
        Duration::from_secs(5),
        3,
        60,
    );
    AppState::new(settings, client, store)
}

/// App state over a fresh in-memory store, talking to a mock PayPal at `paypal_base`.
pub fn app_state(paypal_base: &str) -> (AppState, InMemoryStore) {
    let store = InMemoryStore::new();
    let state = app_state_with_store(paypal_base, Arc::new(store.clone()));
    (state, store)
}

pub fn order(reference: &str) -> Order {
    Order::new(
        reference.to_string(),
        BillingAddress {
            name: "Grace Hopper".to_string(),
            address1: "1 Navy Way".to_string(),
            address2: None,
            city: "Arlington".to_string(),
            postcode: "22201".to_string(),
            country_code: "US".to_string(),
        },
        "USD".to_string(),
        BigDecimal::from_str("99.95").unwrap(),
    )
}

/// Notification carrying the correct url-check for `order`.
pub fn signed_notification(order: &Order, payment_status: &str) -> Notification {
    let check = UrlCheckVerifier::new(SECRET.to_string()).generate(order);
    Notification::new(vec![
        ("mc_gross".to_string(), order.total.to_string()),
        ("invoice".to_string(), order.reference.clone()),
        ("payment_status".to_string(), payment_status.to_string()),
        ("pending_reason".to_string(), "echeck".to_string()),
        ("custom".to_string(), check),
    ])
}

pub fn urlencode(notification: &Notification) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(notification.params())
        .finish()
}
