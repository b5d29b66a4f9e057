use serde::{Deserialize, Serialize};

/// Raw parameters of an inbound payment notification.
///
/// Field order is kept as received: the confirmation round-trip must send the
/// payload back exactly as PayPal posted it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notification {
    params: Vec<(String, String)>,
}

impl Notification {
    pub fn new(params: Vec<(String, String)>) -> Self {
        Self { params }
    }

    /// Parses an `application/x-www-form-urlencoded` body.
    pub fn from_urlencoded(body: &str) -> Self {
        let params = url::form_urlencoded::parse(body.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { params }
    }

    /// First value posted for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn payment_status(&self) -> Option<&str> {
        self.get("payment_status")
    }

    pub fn pending_reason(&self) -> Option<&str> {
        self.get("pending_reason")
    }

    /// Reference of the order the notification claims to settle.
    pub fn order_reference(&self) -> Option<&str> {
        self.get("invoice").filter(|r| !r.is_empty())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl From<Vec<(&str, &str)>> for Notification {
    fn from(params: Vec<(&str, &str)>) -> Self {
        Self::new(
            params
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_urlencoded_keeps_order_and_decodes() {
        let n = Notification::from_urlencoded(
            "payment_status=Completed&invoice=ORD-1&item_name=Order+ORD-1&memo=a%26b",
        );
        assert_eq!(n.params()[0].0, "payment_status");
        assert_eq!(n.params()[3].0, "memo");
        assert_eq!(n.get("item_name"), Some("Order ORD-1"));
        assert_eq!(n.get("memo"), Some("a&b"));
        assert_eq!(n.order_reference(), Some("ORD-1"));
    }

    #[test]
    fn test_missing_and_empty_fields() {
        let n = Notification::from(vec![("invoice", ""), ("payment_status", "Pending")]);
        assert_eq!(n.order_reference(), None);
        assert_eq!(n.pending_reason(), None);
        assert_eq!(n.payment_status(), Some("Pending"));
    }

    #[test]
    fn test_serializes_as_pairs() {
        let n = Notification::from(vec![("a", "1"), ("b", "2")]);
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json, serde_json::json!([["a", "1"], ["b", "2"]]));
        let back: Notification = serde_json::from_value(json).unwrap();
        assert_eq!(back, n);
    }
}
