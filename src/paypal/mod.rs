//! PayPal Website Payments Standard integration.

pub mod checkout;
pub mod client;
pub mod verifier;

pub use checkout::checkout_fields;
pub use client::PaypalClient;
pub use verifier::UrlCheckVerifier;

use url::Url;

use crate::domain::{Basket, Product};

/// Merchant-side PayPal configuration.
#[derive(Debug, Clone)]
pub struct PaypalSettings {
    /// Payment method code, echoed as `bank` in callback URLs.
    pub code: String,
    pub url_action: Url,
    pub account: String,
    pub cert_id: String,
    pub check_secret: String,
    pub url_callback: Url,
    pub url_return_ok: Url,
    pub url_return_ko: Url,
    pub debug: bool,
}

/// PayPal Standard cannot settle recurring charges.
pub fn is_basket_valid(basket: &Basket) -> bool {
    !basket.is_empty() && basket.products().all(is_addable_product)
}

pub fn is_addable_product(product: &Product) -> bool {
    !product.recurrent_payment
}
