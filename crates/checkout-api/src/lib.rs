//! # checkout-api
//!
//! HTTP API layer for storefront-checkout.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Order creation with server-side amount reconciliation
//! - Order capture proxied to PayPal
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/healthz` | Health check |
//! | POST | `/api/paypal/orders` | Create order |
//! | POST | `/api/paypal/orders/{id}/capture` | Capture order |
//! | GET | `/api/paypal/sdk-config` | Browser SDK settings |
//! | GET | `/api/paypal/client-token` | SDK client token |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
