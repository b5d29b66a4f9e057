//! Field set for the PayPal `_xclick` redirect form.

use tracing::debug;
use url::Url;

use crate::domain::Order;
use crate::paypal::verifier::UrlCheckVerifier;
use crate::paypal::PaypalSettings;

/// Build notation sent with every checkout.
pub const BUILD_NOTATION: &str = "PaypalIpnCore/0.1";

/// Appends the `order`, `bank` and `check` query parameters to `base`.
fn signed_url(base: &Url, order: &Order, bank: &str, check: &str) -> String {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("order", &order.reference)
        .append_pair("bank", bank)
        .append_pair("check", check);
    url.into()
}

/// Builds the hidden fields of the checkout form for `order`.
pub fn checkout_fields(
    settings: &PaypalSettings,
    verifier: &UrlCheckVerifier,
    order: &Order,
) -> Vec<(&'static str, String)> {
    let check = verifier.generate(order);
    let bank = settings.code.as_str();

    let fields = vec![
        ("cmd", "_xclick".to_string()),
        ("charset", "utf-8".to_string()),
        ("business", settings.account.clone()),
        ("cert_id", settings.cert_id.clone()),
        // customer cannot add a shipping address or a note
        ("no_shipping", "1".to_string()),
        ("lc", "EN".to_string()),
        ("no_note", "1".to_string()),
        ("invoice", order.reference.clone()),
        ("amount", order.total.to_string()),
        ("currency_code", order.currency.clone()),
        ("item_name", format!("Order {}", order.reference)),
        ("bn", BUILD_NOTATION.to_string()),
        ("first_name", order.billing.name.clone()),
        ("last_name", String::new()),
        ("address1", order.billing.address1.clone()),
        ("address2", order.billing.address2.clone().unwrap_or_default()),
        ("city", order.billing.city.clone()),
        ("zip", order.billing.postcode.clone()),
        ("country", order.billing.country_code.clone()),
        ("custom", check.clone()),
        (
            "notify_url",
            signed_url(&settings.url_callback, order, bank, &check),
        ),
        (
            "cancel_return",
            signed_url(&settings.url_return_ko, order, bank, &check),
        ),
        (
            "return",
            signed_url(&settings.url_return_ok, order, bank, &check),
        ),
    ];

    if settings.debug {
        debug!(order_reference = %order.reference, ?fields, "checkout fields");
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::BillingAddress;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn settings() -> PaypalSettings {
        PaypalSettings {
            code: "paypal".to_string(),
            url_action: Url::parse("https://www.sandbox.paypal.com/cgi-bin/webscr").unwrap(),
            account: "merchant@example.com".to_string(),
            cert_id: "CERT123".to_string(),
            check_secret: "secret".to_string(),
            url_callback: Url::parse("https://shop.example.com/payment/callback").unwrap(),
            url_return_ok: Url::parse("https://shop.example.com/payment/ok").unwrap(),
            url_return_ko: Url::parse("https://shop.example.com/payment/ko").unwrap(),
            debug: false,
        }
    }

    fn order() -> Order {
        Order::new(
            "ORD 9".to_string(),
            BillingAddress {
                name: "Ada Lovelace".to_string(),
                address1: "12 St James's Square".to_string(),
                address2: None,
                city: "London".to_string(),
                postcode: "SW1Y 4JH".to_string(),
                country_code: "GB".to_string(),
            },
            "GBP".to_string(),
            BigDecimal::from_str("42.50").unwrap(),
        )
    }

    fn field<'a>(fields: &'a [(&'static str, String)], name: &str) -> &'a str {
        fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing field {}", name))
    }

    #[test]
    fn test_checkout_fields_describe_the_order() {
        let settings = settings();
        let verifier = UrlCheckVerifier::new(settings.check_secret.clone());
        let fields = checkout_fields(&settings, &verifier, &order());

        assert_eq!(field(&fields, "cmd"), "_xclick");
        assert_eq!(field(&fields, "business"), "merchant@example.com");
        assert_eq!(field(&fields, "invoice"), "ORD 9");
        assert_eq!(field(&fields, "amount"), "42.50");
        assert_eq!(field(&fields, "currency_code"), "GBP");
        assert_eq!(field(&fields, "item_name"), "Order ORD 9");
        assert_eq!(field(&fields, "address2"), "");
        assert_eq!(field(&fields, "country"), "GB");
    }

    #[test]
    fn test_custom_field_round_trips_through_the_verifier() {
        let settings = settings();
        let verifier = UrlCheckVerifier::new(settings.check_secret.clone());
        let order = order();
        let fields = checkout_fields(&settings, &verifier, &order);

        assert!(verifier.verify(&order, field(&fields, "custom")));
    }

    #[test]
    fn test_callback_urls_carry_signed_query() {
        let settings = settings();
        let verifier = UrlCheckVerifier::new(settings.check_secret.clone());
        let order = order();
        let fields = checkout_fields(&settings, &verifier, &order);

        let notify = Url::parse(field(&fields, "notify_url")).unwrap();
        assert_eq!(notify.path(), "/payment/callback");
        let query: Vec<(String, String)> = notify.query_pairs().into_owned().collect();
        assert_eq!(query[0], ("order".to_string(), "ORD 9".to_string()));
        assert_eq!(query[1], ("bank".to_string(), "paypal".to_string()));
        assert_eq!(query[2].1, verifier.generate(&order));

        assert!(field(&fields, "return").starts_with("https://shop.example.com/payment/ok?"));
        assert!(field(&fields, "cancel_return").starts_with("https://shop.example.com/payment/ko?"));
    }
}
