//! Reasons PayPal gives for holding a payment in the `Pending` state.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingReason {
    Address,
    Authorization,
    Echeck,
    Intl,
    MultiCurrency,
    Unilateral,
    Upgrade,
    Verify,
    Other,
}

impl PendingReason {
    pub const ALL: [PendingReason; 9] = [
        PendingReason::Address,
        PendingReason::Authorization,
        PendingReason::Echeck,
        PendingReason::Intl,
        PendingReason::MultiCurrency,
        PendingReason::Unilateral,
        PendingReason::Upgrade,
        PendingReason::Verify,
        PendingReason::Other,
    ];

    /// Resolves a `pending_reason` code. Unknown or missing codes map to `Other`.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("address") => PendingReason::Address,
            Some("authorization") => PendingReason::Authorization,
            Some("echeck") => PendingReason::Echeck,
            Some("intl") => PendingReason::Intl,
            Some("multi-currency") => PendingReason::MultiCurrency,
            Some("unilateral") => PendingReason::Unilateral,
            Some("upgrade") => PendingReason::Upgrade,
            Some("verify") => PendingReason::Verify,
            _ => PendingReason::Other,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PendingReason::Address => "address",
            PendingReason::Authorization => "authorization",
            PendingReason::Echeck => "echeck",
            PendingReason::Intl => "intl",
            PendingReason::MultiCurrency => "multi-currency",
            PendingReason::Unilateral => "unilateral",
            PendingReason::Upgrade => "upgrade",
            PendingReason::Verify => "verify",
            PendingReason::Other => "other",
        }
    }

    // Wording follows the PayPal Order Management integration guide.
    pub fn description(&self) -> &'static str {
        match self {
            PendingReason::Address => "The payment is pending because your customer did not include a confirmed shipping address and your Payment Receiving Preferences is set to allow you to manually accept or deny each of these payments. To change your preference, go to the Preferences section of your Profile.",
            PendingReason::Authorization => "You set PaymentAction to Authorization on SetExpressCheckoutRequest and have not yet captured funds.",
            PendingReason::Echeck => "The payment is pending because it was made by an eCheck that has not yet cleared.",
            PendingReason::Intl => "The payment is pending because you hold a non-U.S. account and do not have a withdrawal mechanism. You must manually accept or deny this payment from your Account Overview.",
            PendingReason::MultiCurrency => "You do not have a balance in the currency sent, and you do not have your Payment Receiving Preferences set to automatically convert and accept this payment. You must manually accept or deny this payment.",
            PendingReason::Unilateral => "The payment is pending because it was made to an email address that is not yet registered or confirmed.",
            PendingReason::Upgrade => "The payment is pending because it was made via credit card and you must upgrade your account to Business or Premier status in order to receive the funds. upgrade can also mean that you have reached the monthly limit for transactions on your account.",
            PendingReason::Verify => "The payment is pending because you are not yet verified. You must verify your account before you can accept this payment.",
            PendingReason::Other => "The payment is pending for a reason other than those listed above. For more information, contact PayPal Customer Service.",
        }
    }
}

impl fmt::Display for PendingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_code_resolves_to_itself() {
        for reason in PendingReason::ALL {
            assert_eq!(PendingReason::from_code(Some(reason.code())), reason);
            assert!(!reason.description().is_empty());
        }
    }

    #[test]
    fn test_unknown_code_falls_back_to_other() {
        assert_eq!(PendingReason::from_code(Some("paymentreview")), PendingReason::Other);
        assert_eq!(PendingReason::from_code(Some("")), PendingReason::Other);
        assert_eq!(PendingReason::from_code(None), PendingReason::Other);
        assert_eq!(
            PendingReason::from_code(Some("nonsense")).description(),
            PendingReason::Other.description()
        );
    }

    #[test]
    fn test_codes_are_case_sensitive() {
        assert_eq!(PendingReason::from_code(Some("ECHECK")), PendingReason::Other);
    }
}
