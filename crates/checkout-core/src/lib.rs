//! # checkout-core
//!
//! Core types and traits for the storefront checkout.
//!
//! This crate provides:
//! - `Currency` and `Price` for minor-unit money handling
//! - `Cart` and the `CartStorage` seam for the client-side cart store
//! - `reconcile` for recomputing an authoritative order total from raw items
//! - `OrderPayload`, `PurchaseUnit` and `OrderLineItem` for the processor
//! - `OrderGateway` for implementing payment processors
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use checkout_core::{reconcile, CreateOrderRequest, OrderPayload, ReconcilePolicy};
//!
//! let request: CreateOrderRequest = serde_json::from_str(body)?;
//! let reconciliation = reconcile(&request, &ReconcilePolicy::default())?;
//!
//! let unit = reconciliation.into_purchase_unit();
//! let payload = OrderPayload::capture(unit, context);
//!
//! let order = gateway.create_order(&payload).await?;
//! ```

pub mod cart;
pub mod currency;
pub mod error;
pub mod gateway;
pub mod order;
pub mod reconcile;

// Re-exports for convenience
pub use cart::{quantity_from_js, Cart, CartItem, CartStorage, MemoryStorage, CART_STORAGE_KEY};
pub use currency::{Currency, Price};
pub use error::{PaymentError, PaymentResult};
pub use gateway::{BoxedOrderGateway, OrderGateway, ReturnUrls};
pub use order::{
    AmountBreakdown, ApplicationContext, CreateOrderRequest, ItemCategory, Money, OrderAmount,
    OrderLineItem, OrderPayload, PurchaseUnit,
};
pub use reconcile::{
    reconcile, NumberLike, RawItem, RawUnitAmount, ReconcilePolicy, Reconciliation,
};
