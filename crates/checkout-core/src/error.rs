//! # Payment Error Types
//!
//! Typed error handling for the checkout.
//! All checkout operations return `Result<T, PaymentError>`.

use serde_json::{json, Value};
use thiserror::Error;

/// Core error type for all checkout operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing credentials, invalid config)
    #[error("{0}")]
    Configuration(String),

    /// Invalid request data
    #[error("{0}")]
    InvalidRequest(String),

    /// Client-declared amount is not a finite positive number
    #[error("Invalid amount")]
    InvalidAmount,

    /// Currency not supported
    #[error("Unsupported currency: {currency}")]
    UnsupportedCurrency { currency: String },

    /// Every item was dropped during normalization
    #[error("No purchasable items")]
    NoPurchasableItems,

    /// Client-declared amount diverges from the recomputed net
    #[error("Amount mismatch")]
    AmountMismatch {
        client_amount: String,
        computed_net: String,
        item_total: String,
        discount: String,
    },

    /// Recomputed net is under the configured minimum
    #[error("Order total below minimum of {minimum}")]
    BelowMinimum { minimum: String, net: String },

    /// Non-2xx answer from the payment processor, passed through as-is
    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        detail: Value,
    },

    /// Network/HTTP error communicating with the processor
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Cart persistence failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PaymentError {
    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Configuration(_) => 500,
            PaymentError::InvalidRequest(_) => 400,
            PaymentError::InvalidAmount => 400,
            PaymentError::UnsupportedCurrency { .. } => 400,
            PaymentError::NoPurchasableItems => 400,
            PaymentError::AmountMismatch { .. } => 400,
            PaymentError::BelowMinimum { .. } => 400,
            PaymentError::Upstream { status, .. } => *status,
            PaymentError::NetworkError(_) => 503,
            PaymentError::Storage(_) => 500,
            PaymentError::Internal(_) => 500,
            PaymentError::Serialization(_) => 500,
        }
    }

    /// Diagnostic detail for the error body, if any
    pub fn detail(&self) -> Option<Value> {
        match self {
            PaymentError::AmountMismatch {
                client_amount,
                computed_net,
                item_total,
                discount,
            } => Some(json!({
                "clientAmount": client_amount,
                "computedNet": computed_net,
                "itemTotal": item_total,
                "discount": discount,
            })),
            PaymentError::BelowMinimum { minimum, net } => Some(json!({
                "minimum": minimum,
                "computedNet": net,
            })),
            PaymentError::Upstream { detail, .. } => Some(detail.clone()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PaymentError {
    fn from(err: serde_json::Error) -> Self {
        PaymentError::Serialization(err.to_string())
    }
}

/// Result type alias for checkout operations
pub type PaymentResult<T> = Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PaymentError::InvalidAmount.status_code(), 400);
        assert_eq!(
            PaymentError::Configuration("Missing env: PAYPAL_CLIENT_ID".into()).status_code(),
            500
        );
        assert_eq!(
            PaymentError::Upstream {
                status: 422,
                message: "create order failed".into(),
                detail: json!({"name": "UNPROCESSABLE_ENTITY"}),
            }
            .status_code(),
            422
        );
    }

    #[test]
    fn test_mismatch_detail() {
        let err = PaymentError::AmountMismatch {
            client_amount: "5.00".into(),
            computed_net: "10.00".into(),
            item_total: "10.00".into(),
            discount: "0.00".into(),
        };
        assert_eq!(err.to_string(), "Amount mismatch");

        let detail = err.detail().unwrap();
        assert_eq!(detail["clientAmount"], "5.00");
        assert_eq!(detail["computedNet"], "10.00");
    }

    #[test]
    fn test_upstream_detail_passthrough() {
        let body = json!({"name": "RESOURCE_NOT_FOUND"});
        let err = PaymentError::Upstream {
            status: 404,
            message: "capture failed".into(),
            detail: body.clone(),
        };
        assert_eq!(err.detail(), Some(body));
        assert!(PaymentError::InvalidAmount.detail().is_none());
    }
}
