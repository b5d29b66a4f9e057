use async_trait::async_trait;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::domain::Notification;
use crate::ports::{ConfirmationClient, ConfirmationError};

/// Command PayPal expects in front of a re-posted notification.
pub const NOTIFY_VALIDATE_CMD: &str = "_notify-validate";

/// HTTP client for the PayPal IPN postback endpoint
#[derive(Clone)]
pub struct PaypalClient {
    client: Client,
    url_action: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl PaypalClient {
    /// Creates a new PaypalClient posting to `url_action`
    pub fn new(url_action: String) -> Self {
        Self::with_circuit_breaker(url_action, Duration::from_secs(30), 3, 60)
    }

    /// Creates a new PaypalClient with custom timeout and circuit breaker configuration
    pub fn with_circuit_breaker(
        url_action: String,
        timeout: Duration,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        PaypalClient {
            client,
            url_action,
            circuit_breaker,
        }
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> String {
        if self.circuit_breaker.is_call_permitted() {
            "closed".to_string()
        } else {
            "open".to_string()
        }
    }

    pub fn url_action(&self) -> &str {
        &self.url_action
    }

    /// Body of the postback: the verify command followed by every field exactly
    /// as received. A received `cmd` is dropped since PayPal reads the first
    /// `cmd` only and it must be the verify command.
    pub fn postback_form(notification: &Notification) -> Vec<(String, String)> {
        let mut form = Vec::with_capacity(notification.params().len() + 1);
        form.push(("cmd".to_string(), NOTIFY_VALIDATE_CMD.to_string()));
        form.extend(
            notification
                .params()
                .iter()
                .filter(|(k, _)| k != "cmd")
                .cloned(),
        );
        form
    }

    /// Posts the notification back to PayPal and returns the response body
    pub async fn postback(&self, notification: &Notification) -> Result<String, ConfirmationError> {
        let client = self.client.clone();
        let url = self.url_action.clone();
        let form = Self::postback_form(notification);

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client.post(&url).form(&form).send().await?;

                let status = response.status();
                if !status.is_success() {
                    return Err(ConfirmationError::InvalidResponse(format!(
                        "unexpected HTTP status {}",
                        status
                    )));
                }

                let body = response.text().await?;
                Ok(body)
            })
            .await;

        match result {
            Ok(body) => {
                debug!(response = %body, "PayPal postback answered");
                Ok(body)
            }
            Err(FailsafeError::Rejected) => Err(ConfirmationError::CircuitBreakerOpen(
                "PayPal postback circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

#[async_trait]
impl ConfirmationClient for PaypalClient {
    async fn confirm(&self, notification: &Notification) -> Result<String, ConfirmationError> {
        self.postback(notification).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn notification() -> Notification {
        Notification::from(vec![
            ("payment_status", "Completed"),
            ("invoice", "ORD-1"),
            ("custom", "abc"),
        ])
    }

    #[test]
    fn test_paypal_client_creation() {
        let client = PaypalClient::new("https://www.sandbox.paypal.com/cgi-bin/webscr".to_string());
        assert_eq!(client.url_action(), "https://www.sandbox.paypal.com/cgi-bin/webscr");
        assert_eq!(client.circuit_state(), "closed");
    }

    #[test]
    fn test_postback_form_prepends_verify_command() {
        let form = PaypalClient::postback_form(&notification());
        assert_eq!(form[0], ("cmd".to_string(), NOTIFY_VALIDATE_CMD.to_string()));
        assert_eq!(form[1].0, "payment_status");
        assert_eq!(form[3].0, "custom");
        assert_eq!(form.len(), 4);
    }

    #[test]
    fn test_postback_form_replaces_received_cmd() {
        let received = Notification::from(vec![
            ("cmd", "_xclick"),
            ("invoice", "ORD-1"),
        ]);
        let form = PaypalClient::postback_form(&received);
        let cmds: Vec<_> = form.iter().filter(|(k, _)| k == "cmd").collect();
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].1, NOTIFY_VALIDATE_CMD);
        assert_eq!(form[1], ("invoice".to_string(), "ORD-1".to_string()));
    }

    #[tokio::test]
    async fn test_postback_returns_verified_body() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/cgi-bin/webscr")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("cmd".into(), NOTIFY_VALIDATE_CMD.into()),
                Matcher::UrlEncoded("payment_status".into(), "Completed".into()),
                Matcher::UrlEncoded("invoice".into(), "ORD-1".into()),
            ]))
            .with_status(200)
            .with_body("VERIFIED")
            .create_async()
            .await;

        let client = PaypalClient::new(format!("{}/cgi-bin/webscr", server.url()));
        let body = client.confirm(&notification()).await.unwrap();

        assert_eq!(body, "VERIFIED");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_postback_server_error_is_a_failure() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/cgi-bin/webscr")
            .with_status(500)
            .create_async()
            .await;

        let client = PaypalClient::new(format!("{}/cgi-bin/webscr", server.url()));
        let result = client.confirm(&notification()).await;

        assert!(matches!(result, Err(ConfirmationError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_circuit_breaker_opens_after_failures() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/cgi-bin/webscr")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let client = PaypalClient::with_circuit_breaker(
            format!("{}/cgi-bin/webscr", server.url()),
            Duration::from_secs(5),
            2,
            60,
        );

        for _ in 0..2 {
            let _ = client.confirm(&notification()).await;
        }

        let result = client.confirm(&notification()).await;
        assert!(matches!(result, Err(ConfirmationError::CircuitBreakerOpen(_))));
        assert_eq!(client.circuit_state(), "open");
    }
}
