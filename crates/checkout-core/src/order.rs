//! # Order Types
//!
//! The incoming order request and the order payload sent to the processor.

use crate::currency::{Currency, Price};
use crate::gateway::ReturnUrls;
use crate::reconcile::{NumberLike, RawItem};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest string the processor accepts in name/sku/description/custom_id
pub const MAX_FIELD_LEN: usize = 127;

/// Truncate to at most [`MAX_FIELD_LEN`] characters
pub(crate) fn clip(value: &str) -> String {
    value.chars().take(MAX_FIELD_LEN).collect()
}

/// Body of `POST /orders`.
///
/// Fields are optional at the type level so validation can answer with the
/// right error instead of a generic parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Client-declared total in major units
    #[serde(default)]
    pub amount: Option<NumberLike>,

    /// ISO 4217 code, defaults to EUR
    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default, alias = "user_id")]
    pub user_id: Option<String>,

    #[serde(default)]
    pub items: Vec<RawItem>,
}

impl CreateOrderRequest {
    /// Append a discount marker (a negative-priced entry) and lower the
    /// declared amount to match.
    pub fn with_discount(mut self, label: impl Into<String>, discount: Price) -> Self {
        let label = label.into();
        let currency = discount.currency;
        let off = discount.amount.abs();

        self.items.push(RawItem {
            item_id: Some(label.clone()),
            name: Some(label),
            price: Some(NumberLike::Text(currency.format_minor(-off))),
            quantity: Some(NumberLike::Number(1.0)),
            ..RawItem::default()
        });

        if let Some(amount) = self.amount.as_ref().and_then(NumberLike::as_f64) {
            let remaining = (currency.to_smallest_unit(amount) - off).max(0);
            self.amount = Some(NumberLike::Text(currency.format_minor(remaining)));
        }
        self
    }
}

/// Currency amount as the processor encodes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub currency_code: Currency,
    pub value: String,
}

impl From<Price> for Money {
    fn from(price: Price) -> Self {
        Self {
            currency_code: price.currency,
            value: price.value(),
        }
    }
}

/// Processor item category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemCategory {
    DigitalGoods,
    PhysicalGoods,
    Donation,
}

impl ItemCategory {
    /// Map a cart item type to a category. Unknown types carry none.
    pub fn from_item_type(item_type: &str) -> Option<Self> {
        match item_type.trim().to_ascii_lowercase().as_str() {
            "digital" | "digital_goods" => Some(ItemCategory::DigitalGoods),
            "physical" | "physical_goods" => Some(ItemCategory::PhysicalGoods),
            "donation" => Some(ItemCategory::Donation),
            _ => None,
        }
    }
}

/// A positive-priced line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub name: String,
    pub sku: String,
    /// Positive integer, string-encoded
    pub quantity: String,
    pub description: String,
    pub unit_amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ItemCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountBreakdown {
    pub item_total: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAmount {
    pub currency_code: Currency,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<AmountBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseUnit {
    pub reference_id: String,
    /// The buyer's user id, for bookkeeping on the processor side
    pub custom_id: String,
    pub invoice_id: String,
    pub amount: OrderAmount,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<OrderLineItem>,
}

impl PurchaseUnit {
    pub const REFERENCE_ID: &'static str = "PU-1";

    pub(crate) fn new_invoice_id() -> String {
        let suffix = Uuid::new_v4().as_u128() % 10_000;
        format!("INV-{}-{}", Utc::now().timestamp_millis(), suffix)
    }
}

/// Checkout experience settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationContext {
    pub shipping_preference: String,
    pub user_action: String,
    pub brand_name: String,
    pub locale: String,
    pub return_url: String,
    pub cancel_url: String,
}

impl ApplicationContext {
    pub fn new(brand_name: impl Into<String>, locale: impl Into<String>, urls: &ReturnUrls) -> Self {
        Self {
            shipping_preference: "NO_SHIPPING".to_string(),
            user_action: "PAY_NOW".to_string(),
            brand_name: brand_name.into(),
            locale: locale.into(),
            return_url: urls.return_url(),
            cancel_url: urls.cancel_url(),
        }
    }
}

/// Create-order payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    pub intent: String,
    pub purchase_units: Vec<PurchaseUnit>,
    pub application_context: ApplicationContext,
}

impl OrderPayload {
    /// Immediate-capture order with a single purchase unit
    pub fn capture(unit: PurchaseUnit, application_context: ApplicationContext) -> Self {
        Self {
            intent: "CAPTURE".to_string(),
            purchase_units: vec![unit],
            application_context,
        }
    }
}
