//! # Amount Reconciliation
//!
//! Turns the loosely-typed items a client sends into processor line items and
//! recomputes the order total from them. The client-declared amount is never
//! trusted: it must match the recomputed net within the policy tolerance or
//! the order is rejected.
//!
//! ```text
//!  raw items ──► normalize ──┬── price > 0 ──► line items ──► item_total ─┐
//!                            ├── price < 0 ──► discount ──────────────────┼─► net = max(0, total − discount)
//!                            └── price = 0 ──► dropped                    │
//!                                                                         ▼
//!                                          |net − client amount| ≤ tolerance, net ≥ minimum
//! ```

use crate::currency::{Currency, Price};
use crate::error::{PaymentError, PaymentResult};
use crate::order::{
    clip, AmountBreakdown, CreateOrderRequest, ItemCategory, Money, OrderAmount, OrderLineItem,
    PurchaseUnit,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A JSON number that may also arrive as a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberLike {
    Number(f64),
    Text(String),
}

impl NumberLike {
    /// Numeric value, if there is one. Blank or unparseable text gives `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NumberLike::Number(n) => Some(*n),
            NumberLike::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    s.parse().ok()
                }
            }
        }
    }
}

/// Processor-style unit amount on an incoming item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawUnitAmount {
    #[serde(default)]
    pub value: Option<NumberLike>,
}

/// An item as the client sends it.
///
/// Accepts both cart-style (`itemId`, `price`, `qty`) and processor-style
/// (`sku`, `unit_amount.value`, `quantity`) fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    #[serde(default, alias = "id", skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, alias = "qty", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<NumberLike>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<NumberLike>,

    #[serde(
        default,
        rename = "unit_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub unit_amount: Option<RawUnitAmount>,

    /// Cart item type, mapped to a processor category when recognized
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Limits applied while reconciling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilePolicy {
    /// Smallest acceptable net, in major units
    pub minimum_total: f64,

    /// Allowed gap between client amount and recomputed net, in minor units
    pub tolerance_minor: i64,

    /// Used when the request names no currency
    pub default_currency: Currency,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            minimum_total: 0.01,
            tolerance_minor: 1,
            default_currency: Currency::EUR,
        }
    }
}

impl ReconcilePolicy {
    /// Builder: set the minimum order total (major units)
    pub fn with_minimum_total(mut self, minimum_total: f64) -> Self {
        self.minimum_total = minimum_total;
        self
    }

    /// Builder: set the tolerance (minor units)
    pub fn with_tolerance(mut self, tolerance_minor: i64) -> Self {
        self.tolerance_minor = tolerance_minor;
        self
    }
}

/// Result of a successful reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub currency: Currency,
    /// Buyer id, already trimmed to the processor's field limit
    pub custom_id: String,
    pub line_items: Vec<OrderLineItem>,
    pub item_total: Price,
    pub discount: Price,
    pub net: Price,
    pub client_amount: Price,
}

impl Reconciliation {
    /// Purchase unit with breakdown and bookkeeping ids
    pub fn into_purchase_unit(self) -> PurchaseUnit {
        let discount = (self.discount.amount > 0).then(|| Money::from(self.discount));

        PurchaseUnit {
            reference_id: PurchaseUnit::REFERENCE_ID.to_string(),
            custom_id: self.custom_id,
            invoice_id: PurchaseUnit::new_invoice_id(),
            amount: OrderAmount {
                currency_code: self.currency,
                value: self.net.value(),
                breakdown: Some(AmountBreakdown {
                    item_total: Money::from(self.item_total),
                    discount,
                }),
            },
            items: self.line_items,
        }
    }
}

struct Normalized {
    line_items: Vec<OrderLineItem>,
    item_total: i64,
    discount: i64,
}

fn normalize(items: &[RawItem], currency: Currency) -> Normalized {
    let mut line_items = Vec::new();
    let mut item_total = 0_i64;
    let mut discount = 0_i64;

    for (idx, item) in items.iter().enumerate() {
        let label = format!("Item {}", idx + 1);

        let qty = match item.quantity.as_ref() {
            None => 1.0,
            Some(q) => match q.as_f64() {
                Some(q) if q.is_finite() => q.floor().max(1.0),
                _ => {
                    debug!("Dropping item {}: bad quantity", idx + 1);
                    continue;
                }
            },
        };
        let qty = qty as i64;

        let price = item
            .unit_amount
            .as_ref()
            .and_then(|u| u.value.as_ref())
            .or(item.price.as_ref());
        let price = match price {
            None => 0.0,
            Some(p) => match p.as_f64() {
                Some(p) if p.is_finite() => p,
                _ => {
                    debug!("Dropping item {}: bad price", idx + 1);
                    continue;
                }
            },
        };

        let unit = currency.to_smallest_unit(price);
        if unit < 0 {
            discount = discount.saturating_add(unit.saturating_abs().saturating_mul(qty));
            continue;
        }
        if unit == 0 {
            continue;
        }

        let sku = clip(
            item.sku
                .as_deref()
                .or(item.item_id.as_deref())
                .unwrap_or(""),
        );
        let description = match item.description.as_deref() {
            Some(d) => clip(d),
            None if !sku.is_empty() => sku.clone(),
            None => label.clone(),
        };
        let name = clip(item.name.as_deref().unwrap_or(&label));
        let category = item
            .category
            .as_deref()
            .and_then(ItemCategory::from_item_type);

        item_total = item_total.saturating_add(unit.saturating_mul(qty));
        line_items.push(OrderLineItem {
            name,
            sku,
            quantity: qty.to_string(),
            description,
            unit_amount: Money::from(Price::from_cents(unit, currency)),
            category,
        });
    }

    Normalized {
        line_items,
        item_total,
        discount,
    }
}

/// Validate a create-order request and recompute its authoritative total.
pub fn reconcile(
    request: &CreateOrderRequest,
    policy: &ReconcilePolicy,
) -> PaymentResult<Reconciliation> {
    let client_amount = request
        .amount
        .as_ref()
        .and_then(NumberLike::as_f64)
        .filter(|a| a.is_finite() && *a > 0.0)
        .ok_or(PaymentError::InvalidAmount)?;

    let user_id = request
        .user_id
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| PaymentError::InvalidRequest("Missing userId".to_string()))?;

    let currency = match request.currency.as_deref() {
        Some(code) => code.parse::<Currency>()?,
        None => policy.default_currency,
    };

    let normalized = normalize(&request.items, currency);
    if normalized.line_items.is_empty() {
        return Err(PaymentError::NoPurchasableItems);
    }

    let net = (normalized.item_total - normalized.discount).max(0);
    let client_minor = currency.to_smallest_unit(client_amount);

    let item_total = Price::from_cents(normalized.item_total, currency);
    let discount = Price::from_cents(normalized.discount, currency);
    let net = Price::from_cents(net, currency);
    let client = Price::from_cents(client_minor, currency);

    if (net.amount - client.amount).abs() > policy.tolerance_minor {
        warn!(
            client_amount = %client.value(),
            computed_net = %net.value(),
            "Client/server amount mismatch"
        );
        return Err(PaymentError::AmountMismatch {
            client_amount: client.value(),
            computed_net: net.value(),
            item_total: item_total.value(),
            discount: discount.value(),
        });
    }

    // Never below one minor unit, even where the configured minimum rounds to 0
    let minimum = Price::new(policy.minimum_total, currency);
    let minimum = Price::from_cents(minimum.amount.max(1), currency);
    if net.amount < minimum.amount {
        return Err(PaymentError::BelowMinimum {
            minimum: minimum.value(),
            net: net.value(),
        });
    }

    debug!(
        "Reconciled order: {} lines, item_total={}, discount={}, net={}",
        normalized.line_items.len(),
        item_total.value(),
        discount.value(),
        net.value()
    );

    Ok(Reconciliation {
        currency,
        custom_id: clip(user_id),
        line_items: normalized.line_items,
        item_total,
        discount,
        net,
        client_amount: client,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> CreateOrderRequest {
        serde_json::from_value(body).unwrap()
    }

    fn run(body: serde_json::Value) -> PaymentResult<Reconciliation> {
        reconcile(&request(body), &ReconcilePolicy::default())
    }

    #[test]
    fn test_simple_order_accepted() {
        let r = run(json!({
            "amount": 20.00,
            "userId": "uid-1",
            "items": [{"price": 10, "qty": 2}]
        }))
        .unwrap();

        assert_eq!(r.item_total.value(), "20.00");
        assert_eq!(r.discount.value(), "0.00");
        assert_eq!(r.net.value(), "20.00");
        assert_eq!(r.line_items[0].quantity, "2");
        assert_eq!(r.line_items[0].name, "Item 1");
        assert_eq!(r.line_items[0].description, "Item 1");
    }

    #[test]
    fn test_negative_entry_becomes_discount() {
        let r = run(json!({
            "amount": "8.00",
            "userId": "uid-1",
            "items": [
                {"itemId": "tee", "name": "T-Shirt", "price": 10, "qty": 1},
                {"itemId": "promo", "price": -2, "qty": 1}
            ]
        }))
        .unwrap();

        assert_eq!(r.discount.value(), "2.00");
        assert_eq!(r.net.value(), "8.00");
        assert_eq!(r.line_items.len(), 1);

        let unit = r.into_purchase_unit();
        let breakdown = unit.amount.breakdown.unwrap();
        assert_eq!(breakdown.item_total.value, "10.00");
        assert_eq!(breakdown.discount.unwrap().value, "2.00");
        assert_eq!(unit.amount.value, "8.00");
    }

    #[test]
    fn test_mismatch_rejected() {
        let err = run(json!({
            "amount": 5.00,
            "userId": "uid-1",
            "items": [{"price": 10, "qty": 1}]
        }))
        .unwrap_err();

        assert_eq!(err.to_string(), "Amount mismatch");
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.detail().unwrap()["computedNet"], "10.00");
    }

    #[test]
    fn test_one_cent_tolerance() {
        let body = |amount: &str| {
            json!({"amount": amount, "userId": "u", "items": [{"price": "9.99", "qty": 1}]})
        };

        assert!(run(body("10.00")).is_ok());
        assert!(run(body("9.98")).is_ok());
        assert!(matches!(
            run(body("10.01")),
            Err(PaymentError::AmountMismatch { .. })
        ));
    }

    #[test]
    fn test_net_formula_over_item_sets() {
        let cases: &[(&[(f64, f64)], i64)] = &[
            (&[(10.0, 2.0)], 2000),
            (&[(10.0, 1.0), (-2.0, 1.0)], 800),
            (&[(4.99, 3.0), (-1.5, 2.0), (0.0, 5.0)], 1197),
            (&[(5.0, 1.0), (-7.0, 1.0)], 0),
            (&[(1.25, 4.0), (-0.25, 4.0)], 400),
        ];

        for (items, expected) in cases {
            let raw: Vec<_> = items
                .iter()
                .map(|(p, q)| json!({"price": p, "qty": q}))
                .collect();
            let normalized = normalize(&request(json!({"items": raw})).items, Currency::EUR);
            let net = (normalized.item_total - normalized.discount).max(0);
            assert_eq!(net, *expected, "items={:?}", items);
        }
    }

    #[test]
    fn test_invalid_amount_and_user() {
        let items = json!([{"price": 1, "qty": 1}]);
        for amount in [json!(0), json!(-3), json!("abc"), json!(null)] {
            let err = run(json!({"amount": amount, "userId": "u", "items": items.clone()}))
                .unwrap_err();
            assert!(matches!(err, PaymentError::InvalidAmount), "amount={}", amount);
        }

        let err = run(json!({"amount": 1, "items": items.clone()})).unwrap_err();
        assert_eq!(err.to_string(), "Missing userId");
        let err = run(json!({"amount": 1, "userId": "", "items": items})).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_unsupported_currency() {
        let err = run(json!({
            "amount": 1, "userId": "u", "currency": "BTC",
            "items": [{"price": 1}]
        }))
        .unwrap_err();
        assert!(matches!(err, PaymentError::UnsupportedCurrency { .. }));
    }

    #[test]
    fn test_no_purchasable_items() {
        let err = run(json!({
            "amount": 1, "userId": "u",
            "items": [{"price": 0, "qty": 2}, {"price": -1}]
        }))
        .unwrap_err();
        assert!(matches!(err, PaymentError::NoPurchasableItems));
    }

    #[test]
    fn test_below_minimum() {
        let policy = ReconcilePolicy::default().with_minimum_total(5.0);
        let err = reconcile(
            &request(json!({"amount": 4, "userId": "u", "items": [{"price": 4}]})),
            &policy,
        )
        .unwrap_err();
        assert!(matches!(err, PaymentError::BelowMinimum { .. }));
        assert_eq!(err.detail().unwrap()["minimum"], "5.00");
    }

    #[test]
    fn test_zero_decimal_currency() {
        let r = run(json!({
            "amount": 1500, "currency": "JPY", "userId": "u",
            "items": [{"price": 500, "qty": 3}]
        }))
        .unwrap();
        assert_eq!(r.net.value(), "1500");
        assert_eq!(r.line_items[0].unit_amount.value, "500");
    }

    #[test]
    fn test_zero_net_rejected_in_zero_decimal_currency() {
        // 0.01 rounds to 0 yen; the floor is still one unit
        let err = run(json!({
            "amount": 1, "currency": "JPY", "userId": "u",
            "items": [{"price": 500}, {"price": -500}]
        }))
        .unwrap_err();
        assert!(matches!(err, PaymentError::BelowMinimum { .. }));
        let detail = err.detail().unwrap();
        assert_eq!(detail["minimum"], "1");
        assert_eq!(detail["computedNet"], "0");
    }

    #[test]
    fn test_exact_match_policy() {
        let policy = ReconcilePolicy::default().with_tolerance(0);
        let body = |amount: &str| {
            request(json!({"amount": amount, "userId": "u", "items": [{"price": "9.99"}]}))
        };

        assert!(reconcile(&body("9.99"), &policy).is_ok());
        assert!(matches!(
            reconcile(&body("10.00"), &policy),
            Err(PaymentError::AmountMismatch { .. })
        ));
    }

    #[test]
    fn test_quantity_normalization() {
        let r = run(json!({
            "amount": 6, "userId": "u",
            "items": [
                {"price": 1.5, "quantity": "2.7"},
                {"price": 1.5, "qty": -4},
                {"price": 1.5},
                {"price": 1.5, "qty": "lots"}
            ]
        }))
        .unwrap();

        let qtys: Vec<_> = r.line_items.iter().map(|l| l.quantity.as_str()).collect();
        assert_eq!(qtys, ["2", "1", "1"]);
        assert_eq!(r.net.value(), "6.00");
    }

    #[test]
    fn test_processor_style_fields_win() {
        let r = run(json!({
            "amount": 3, "userId": "u", "currency": "usd",
            "items": [{
                "sku": "SKU-1", "itemId": "ignored",
                "unit_amount": {"value": "3.00"}, "price": 99,
                "type": "digital"
            }]
        }))
        .unwrap();

        let line = &r.line_items[0];
        assert_eq!(line.sku, "SKU-1");
        assert_eq!(line.description, "SKU-1");
        assert_eq!(line.unit_amount.value, "3.00");
        assert_eq!(line.unit_amount.currency_code, Currency::USD);
        assert_eq!(line.category, Some(ItemCategory::DigitalGoods));
    }

    #[test]
    fn test_precision_clamped_to_two_decimals() {
        let r = run(json!({
            "amount": 9.99, "userId": "u",
            "items": [{"price": 3.3333, "qty": 3}]
        }))
        .unwrap();
        assert_eq!(r.line_items[0].unit_amount.value, "3.33");
        assert_eq!(r.item_total.value(), "9.99");
    }

    #[test]
    fn test_long_fields_truncated() {
        let long = "n".repeat(300);
        let r = run(json!({
            "amount": 1, "userId": long,
            "items": [{"name": long, "sku": long, "price": 1}]
        }))
        .unwrap();
        assert_eq!(r.custom_id.len(), 127);
        assert_eq!(r.line_items[0].name.len(), 127);
        assert_eq!(r.line_items[0].sku.len(), 127);
    }

    #[test]
    fn test_purchase_unit_without_discount() {
        let unit = run(json!({"amount": 2, "userId": "uid-9", "items": [{"price": 2}]}))
            .unwrap()
            .into_purchase_unit();

        assert_eq!(unit.reference_id, "PU-1");
        assert_eq!(unit.custom_id, "uid-9");
        assert!(unit.amount.breakdown.unwrap().discount.is_none());
    }
}
