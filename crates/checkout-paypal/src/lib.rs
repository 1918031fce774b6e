//! # checkout-paypal
//!
//! PayPal order gateway for storefront-checkout.
//!
//! Wraps three PayPal REST calls behind [`checkout_core::OrderGateway`]:
//!
//! 1. `POST /v1/oauth2/token` - client-credential token exchange
//! 2. `POST /v2/checkout/orders` - create an order from a reconciled payload
//! 3. `POST /v2/checkout/orders/{id}/capture` - capture an approved order
//!
//! Upstream failures keep their HTTP status and JSON body so the API layer can
//! hand them to the caller unchanged.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use checkout_paypal::PayPalGateway;
//! use checkout_core::OrderGateway;
//!
//! let gateway = PayPalGateway::from_env()?;
//! let order = gateway.create_order(&payload).await?;
//!
//! // ...buyer approves in the PayPal popup...
//! let capture = gateway.capture_order(order["id"].as_str().unwrap()).await?;
//! ```

pub mod config;
pub mod orders;

// Re-exports
pub use config::PayPalConfig;
pub use orders::PayPalGateway;
