//! Minimal basket model, enough to decide whether PayPal can settle it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    /// Subscriptions and other recurring charges.
    pub recurrent_payment: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketElement {
    pub product: Product,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Basket {
    pub elements: Vec<BasketElement>,
}

impl Basket {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.elements.iter().map(|e| &e.product)
    }
}
