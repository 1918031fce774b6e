//! # Order Gateway Trait
//!
//! Seam between the HTTP layer and the payment processor.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    OrderGateway (trait)                     │
//! │  ├── create_order()                                         │
//! │  ├── capture_order()                                        │
//! │  ├── client_token()                                         │
//! │  └── ping()                                                 │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                    ┌───────┴───────┐
//!                    │ PayPalGateway │
//!                    └───────────────┘
//! ```

use crate::error::PaymentResult;
use crate::order::OrderPayload;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Payment processor operations used by the checkout.
///
/// Every call is a single attempt. Processor responses are returned as raw
/// JSON so callers see exactly what the processor sent.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Create an order from a reconciled payload.
    async fn create_order(&self, payload: &OrderPayload) -> PaymentResult<Value>;

    /// Capture a previously approved order.
    async fn capture_order(&self, order_id: &str) -> PaymentResult<Value>;

    /// Issue a client token for the browser SDK.
    async fn client_token(&self) -> PaymentResult<String>;

    /// Check that credentials are accepted.
    async fn ping(&self) -> PaymentResult<()>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared gateway (dynamic dispatch)
pub type BoxedOrderGateway = Arc<dyn OrderGateway>;

/// Where the processor sends the buyer after approval or cancellation
#[derive(Debug, Clone)]
pub struct ReturnUrls {
    /// Public base URL of the storefront (e.g., "https://shop.example")
    pub base_url: String,
    pub return_path: String,
    pub cancel_path: String,
}

impl ReturnUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            return_path: "/paypal/return".to_string(),
            cancel_path: "/paypal/cancel".to_string(),
        }
    }

    pub fn return_url(&self) -> String {
        format!("{}{}", self.base_url, self.return_path)
    }

    pub fn cancel_url(&self) -> String {
        format!("{}{}", self.base_url, self.cancel_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaymentError;

    struct Offline;

    #[async_trait]
    impl OrderGateway for Offline {
        async fn create_order(&self, _payload: &OrderPayload) -> PaymentResult<Value> {
            Err(PaymentError::NetworkError("offline".into()))
        }

        async fn capture_order(&self, order_id: &str) -> PaymentResult<Value> {
            Ok(serde_json::json!({ "id": order_id, "status": "COMPLETED" }))
        }

        async fn client_token(&self) -> PaymentResult<String> {
            Ok("token".into())
        }

        async fn ping(&self) -> PaymentResult<()> {
            Ok(())
        }

        fn provider_name(&self) -> &'static str {
            "offline"
        }
    }

    #[test]
    fn test_return_urls() {
        let urls = ReturnUrls::new("https://shop.example/");

        assert_eq!(urls.return_url(), "https://shop.example/paypal/return");
        assert_eq!(urls.cancel_url(), "https://shop.example/paypal/cancel");
    }

    #[tokio::test]
    async fn test_boxed_gateway_dispatch() {
        let gateway: BoxedOrderGateway = Arc::new(Offline);

        let captured = gateway.capture_order("5O190127TN364715T").await.unwrap();
        assert_eq!(captured["status"], "COMPLETED");
        assert_eq!(gateway.provider_name(), "offline");
    }
}
