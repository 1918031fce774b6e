//! # PayPal Orders
//!
//! Client-credential token exchange plus the Orders v2 create/capture calls.
//! Each operation fetches a fresh token and makes exactly one attempt.

use crate::config::PayPalConfig;
use async_trait::async_trait;
use checkout_core::{OrderGateway, OrderPayload, PaymentError, PaymentResult};
use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};

/// PayPal implementation of [`OrderGateway`]
pub struct PayPalGateway {
    config: PayPalConfig,
    client: Client,
}

impl PayPalGateway {
    /// Create a new gateway
    pub fn new(config: PayPalConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        Self::new(PayPalConfig::from_env())
    }

    pub fn config(&self) -> &PayPalConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Exchange client credentials for a bearer token
    #[instrument(skip(self))]
    pub async fn access_token(&self) -> PaymentResult<String> {
        let (client_id, secret) = self.config.credentials()?;

        let response = self
            .client
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(client_id, Some(secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = read_json(response).await?;

        if !status.is_success() {
            let reason = body
                .get("error_description")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| status.to_string());
            error!("PayPal token exchange failed: status={}, reason={}", status, reason);

            return Err(PaymentError::Upstream {
                status: status.as_u16(),
                message: format!("PayPal token error: {}", reason),
                detail: body,
            });
        }

        let token: TokenResponse = serde_json::from_value(body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse PayPal token response: {}", e))
        })?;
        debug!("Obtained PayPal access token (expires_in={:?})", token.expires_in);

        Ok(token.access_token)
    }

    /// Send an authenticated request; non-2xx answers become `Upstream`
    /// errors carrying the processor's status and body.
    async fn send(&self, request: RequestBuilder, failure: &str) -> PaymentResult<Value> {
        let response = request
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = read_json(response).await?;

        if !status.is_success() {
            error!("PayPal {}: status={}, body={}", failure, status, body);
            return Err(PaymentError::Upstream {
                status: status.as_u16(),
                message: failure.to_string(),
                detail: body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl OrderGateway for PayPalGateway {
    #[instrument(skip(self, payload))]
    async fn create_order(&self, payload: &OrderPayload) -> PaymentResult<Value> {
        let token = self.access_token().await?;

        let request = self
            .client
            .post(self.url("/v2/checkout/orders"))
            .bearer_auth(token)
            .header("Accept", "application/json")
            .json(payload);

        let order = self.send(request, "create order failed").await?;

        info!(
            "Created PayPal order: id={}, status={}",
            order.get("id").and_then(serde_json::Value::as_str).unwrap_or("?"),
            order.get("status").and_then(serde_json::Value::as_str).unwrap_or("?")
        );
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn capture_order(&self, order_id: &str) -> PaymentResult<Value> {
        validate_order_id(order_id)?;
        let token = self.access_token().await?;

        let request_id = format!("{}-{}", order_id, Utc::now().timestamp_millis());
        let request = self
            .client
            .post(self.url(&format!("/v2/checkout/orders/{}/capture", order_id)))
            .bearer_auth(token)
            .header("Accept", "application/json")
            .header("PayPal-Request-Id", request_id)
            .json(&json!({}));

        let capture = self.send(request, "capture failed").await?;

        info!(
            "Captured PayPal order: id={}, status={}",
            order_id,
            capture.get("status").and_then(serde_json::Value::as_str).unwrap_or("?")
        );
        Ok(capture)
    }

    #[instrument(skip(self))]
    async fn client_token(&self) -> PaymentResult<String> {
        let token = self.access_token().await?;

        let request = self
            .client
            .post(self.url("/v1/identity/generate-token"))
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .header("Accept-Language", "en_GB");

        let body = self.send(request, "generate-token failed").await?;
        let parsed: ClientTokenResponse = serde_json::from_value(body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse client token response: {}", e))
        })?;

        Ok(parsed.client_token)
    }

    async fn ping(&self) -> PaymentResult<()> {
        self.access_token().await.map(|_| ())
    }

    fn provider_name(&self) -> &'static str {
        "paypal"
    }
}

// =============================================================================
// PayPal API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ClientTokenResponse {
    client_token: String,
}

/// Body as JSON; an empty or non-JSON body reads as `{}`.
async fn read_json(response: reqwest::Response) -> PaymentResult<Value> {
    let text = response
        .text()
        .await
        .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

    Ok(serde_json::from_str(&text).unwrap_or_else(|_| json!({})))
}

/// Order ids are alphanumeric; anything else could rewrite the request path.
fn validate_order_id(order_id: &str) -> PaymentResult<()> {
    let valid = !order_id.is_empty()
        && order_id.len() <= 64
        && order_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(PaymentError::InvalidRequest(format!(
            "Invalid order id: {}",
            order_id
        )))
    }
}
