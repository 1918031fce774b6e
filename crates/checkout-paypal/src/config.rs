//! # PayPal Configuration
//!
//! Configuration management for the PayPal integration.
//! All secrets are loaded from environment variables.
//!
//! Credentials are allowed to be missing at startup; every outbound call
//! checks them first and fails with a configuration error naming what is
//! missing.

use checkout_core::{PaymentError, PaymentResult, ReturnUrls};
use std::env;

pub const LIVE_API_BASE_URL: &str = "https://api-m.paypal.com";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:5173";

/// PayPal REST configuration
#[derive(Debug, Clone)]
pub struct PayPalConfig {
    /// REST app client id
    pub client_id: Option<String>,

    /// REST app secret
    pub client_secret: Option<String>,

    /// API base URL (live, sandbox, or a mock in tests)
    pub api_base_url: String,

    /// Public storefront URL, used for return/cancel links
    pub public_base_url: String,
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Endpoint paths are appended with a leading `/`
fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

impl PayPalConfig {
    /// Load configuration from environment variables.
    ///
    /// Read env vars:
    /// - `PAYPAL_CLIENT_ID`
    /// - `PAYPAL_CLIENT_SECRET`
    /// - `PAYPAL_BASE_URL` (default: live API)
    /// - `PUBLIC_BASE_URL`
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self {
            client_id: non_empty("PAYPAL_CLIENT_ID"),
            client_secret: non_empty("PAYPAL_CLIENT_SECRET"),
            api_base_url: non_empty("PAYPAL_BASE_URL")
                .map(|url| trim_base_url(&url))
                .unwrap_or_else(|| LIVE_API_BASE_URL.to_string()),
            public_base_url: non_empty("PUBLIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string()),
        }
    }

    /// Create config with explicit values (for testing)
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            api_base_url: LIVE_API_BASE_URL.to_string(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
        }
    }

    /// Client id and secret, or a configuration error listing what is unset
    pub fn credentials(&self) -> PaymentResult<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            (id, secret) => {
                let mut missing = Vec::new();
                if id.is_none() {
                    missing.push("PAYPAL_CLIENT_ID");
                }
                if secret.is_none() {
                    missing.push("PAYPAL_CLIENT_SECRET");
                }
                Err(PaymentError::Configuration(format!(
                    "Missing env: {}",
                    missing.join(", ")
                )))
            }
        }
    }

    /// "sandbox" or "live", derived from the API host
    pub fn environment(&self) -> &'static str {
        if self.api_base_url.contains("sandbox") {
            "sandbox"
        } else {
            "live"
        }
    }

    /// Last 8 characters of the client id, safe to expose for debugging
    pub fn client_id_suffix(&self) -> Option<String> {
        self.client_id.as_deref().map(|id| {
            let chars: Vec<char> = id.chars().collect();
            chars[chars.len().saturating_sub(8)..].iter().collect()
        })
    }

    pub fn has_secret(&self) -> bool {
        self.client_secret.is_some()
    }

    pub fn return_urls(&self) -> ReturnUrls {
        ReturnUrls::new(&self.public_base_url)
    }

    /// Builder: set custom API base URL (sandbox or mock server)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.api_base_url = trim_base_url(&url);
        self
    }

    /// Builder: set the public storefront URL
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into();
        self
    }
}
