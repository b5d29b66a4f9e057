use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;
use url::Url;

use crate::paypal::PaypalSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Without a database the service keeps orders in memory.
    pub database_url: Option<String>,
    pub paypal: PaypalSettings,
    pub paypal_timeout: Duration,
    pub paypal_failure_threshold: u32,
    pub paypal_reset_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key).with_context(|| format!("{} must be set", key))
        };
        let url = |key: &str| -> Result<Url> {
            let raw = required(key)?;
            Url::parse(&raw).with_context(|| format!("{} is not a valid URL", key))
        };

        let paypal = PaypalSettings {
            code: lookup("PAYPAL_CODE").unwrap_or_else(|| "paypal".to_string()),
            url_action: url("PAYPAL_URL_ACTION")?,
            account: required("PAYPAL_ACCOUNT")?,
            cert_id: lookup("PAYPAL_CERT_ID").unwrap_or_default(),
            check_secret: required("PAYPAL_CHECK_SECRET")?,
            url_callback: url("PAYPAL_URL_CALLBACK")?,
            url_return_ok: url("PAYPAL_URL_RETURN_OK")?,
            url_return_ko: url("PAYPAL_URL_RETURN_KO")?,
            debug: lookup("PAYPAL_DEBUG")
                .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"))
                .unwrap_or(false),
        };

        if paypal.check_secret.is_empty() {
            anyhow::bail!("PAYPAL_CHECK_SECRET must not be empty");
        }

        Ok(Config {
            server_port: lookup("SERVER_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a port number")?,
            database_url: lookup("DATABASE_URL").filter(|v| !v.is_empty()),
            paypal,
            paypal_timeout: Duration::from_secs(
                lookup("PAYPAL_TIMEOUT_SECS")
                    .unwrap_or_else(|| "30".to_string())
                    .parse()
                    .context("PAYPAL_TIMEOUT_SECS must be a number of seconds")?,
            ),
            paypal_failure_threshold: lookup("PAYPAL_FAILURE_THRESHOLD")
                .unwrap_or_else(|| "3".to_string())
                .parse()
                .context("PAYPAL_FAILURE_THRESHOLD must be a number")?,
            paypal_reset_timeout_secs: lookup("PAYPAL_RESET_TIMEOUT_SECS")
                .unwrap_or_else(|| "60".to_string())
                .parse()
                .context("PAYPAL_RESET_TIMEOUT_SECS must be a number of seconds")?,
        })
    }
}
