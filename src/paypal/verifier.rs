use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::{Notification, Order};
use crate::ports::NotificationVerifier;

type HmacSha256 = Hmac<Sha256>;

/// Authenticates notifications through the order url-check.
///
/// The check is an HMAC over the order's reference, total and currency. It is
/// handed to PayPal in the checkout `custom` field and PayPal echoes it back
/// in every notification for that order.
#[derive(Clone)]
pub struct UrlCheckVerifier {
    secret: String,
}

impl UrlCheckVerifier {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    fn mac(&self, order: &Order) -> HmacSha256 {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(order.reference.as_bytes());
        mac.update(b"|");
        mac.update(order.total.to_string().as_bytes());
        mac.update(b"|");
        mac.update(order.currency.as_bytes());
        mac
    }

    /// Hex-encoded url-check for `order`.
    pub fn generate(&self, order: &Order) -> String {
        hex::encode(self.mac(order).finalize().into_bytes())
    }

    /// Constant-time comparison of `check` against the order's url-check.
    pub fn verify(&self, order: &Order, check: &str) -> bool {
        match hex::decode(check) {
            Ok(bytes) => self.mac(order).verify_slice(&bytes).is_ok(),
            Err(_) => false,
        }
    }
}

impl NotificationVerifier for UrlCheckVerifier {
    fn is_valid(&self, notification: &Notification, order: &Order) -> bool {
        notification
            .get("custom")
            .map(|check| self.verify(order, check))
            .unwrap_or(false)
    }
}
