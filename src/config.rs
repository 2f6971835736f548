use crate::error::{PaymentError, Result};
use std::env;
use std::time::Duration;
use tracing::info;

/// iyzico sandbox host; override with `IYZICO_BASE_URL` for production.
const DEFAULT_BASE_URL: &str = "https://sandbox-api.iyzipay.com";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Credentials and connection settings for the payment gateway.
///
/// Loaded once at startup so missing secrets fail the process before any
/// request is attempted.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: String,
    pub secret_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let secret_key = secret_key.into();
        if api_key.trim().is_empty() {
            return Err(PaymentError::ConfigurationError(
                "gateway API key is empty".to_string(),
            ));
        }
        if secret_key.trim().is_empty() {
            return Err(PaymentError::ConfigurationError(
                "gateway secret key is empty".to_string(),
            ));
        }
        Ok(Self {
            api_key,
            secret_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Reads `IYZICO_API_KEY`, `IYZICO_SECRET_KEY`, `IYZICO_BASE_URL` and
    /// `IYZICO_TIMEOUT_SECS` from the environment.
    pub fn from_env() -> Result<Self> {
        let api_key = require_var("IYZICO_API_KEY")?;
        let secret_key = require_var("IYZICO_SECRET_KEY")?;
        let mut config = Self::new(api_key, secret_key)?;

        match env::var("IYZICO_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => config.base_url = url,
            _ => info!("IYZICO_BASE_URL not set, using sandbox: {DEFAULT_BASE_URL}"),
        }

        match env::var("IYZICO_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    PaymentError::ConfigurationError(format!(
                        "IYZICO_TIMEOUT_SECS is not a valid number of seconds: {raw}"
                    ))
                })?;
                config.timeout = Duration::from_secs(secs);
            }
            Err(_) => info!("IYZICO_TIMEOUT_SECS not set, using default: {DEFAULT_TIMEOUT_SECS}"),
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn require_var(key: &str) -> Result<String> {
    env::var(key)
        .map_err(|_| PaymentError::ConfigurationError(format!("{key} is not set")))
        .and_then(|v| {
            if v.trim().is_empty() {
                Err(PaymentError::ConfigurationError(format!("{key} is empty")))
            } else {
                Ok(v)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        let result = GatewayConfig::new("", "secret");
        assert!(matches!(result, Err(PaymentError::ConfigurationError(_))));
    }

    #[test]
    fn test_empty_secret_key_rejected() {
        let result = GatewayConfig::new("api", "   ");
        assert!(matches!(result, Err(PaymentError::ConfigurationError(_))));
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::new("api", "secret").unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_builder_overrides() {
        let config = GatewayConfig::new("api", "secret")
            .unwrap()
            .with_base_url("https://api.iyzipay.com")
            .with_timeout(Duration::from_secs(30));
        assert_eq!(config.base_url, "https://api.iyzipay.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
