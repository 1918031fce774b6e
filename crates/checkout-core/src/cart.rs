//! # Cart Store
//!
//! Ordered list of cart lines, persisted after every mutation through a
//! [`CartStorage`] backend (`localStorage` in the browser, memory in tests).
//!
//! Quantities are always positive: anything that would drop a line to zero
//! or below removes it instead.

use crate::currency::{Currency, Price};
use crate::error::{PaymentError, PaymentResult};
use crate::order::CreateOrderRequest;
use crate::reconcile::{NumberLike, RawItem};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Key the cart is stored under
pub const CART_STORAGE_KEY: &str = "cart:v1";

/// Key/value persistence used by the cart
pub trait CartStorage {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> PaymentResult<()>;
}

/// In-process storage, used natively and in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value (e.g. a previously saved cart)
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl CartStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> PaymentResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A line in the cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Unique within a cart
    #[serde(alias = "id")]
    pub item_id: String,

    #[serde(default)]
    pub name: String,

    /// Unit price in major units, never negative
    #[serde(default)]
    pub price: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,

    /// Always > 0 once the item is in a cart
    #[serde(default = "default_qty")]
    pub qty: i64,
}

fn default_qty() -> i64 {
    1
}

impl CartItem {
    pub fn new(item_id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.into(),
            price,
            image: None,
            item_type: None,
            qty: 1,
        }
    }

    /// Builder: set image URL
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    /// Builder: set item type (e.g. "digital")
    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    /// Line total in the given currency
    pub fn total(&self, currency: Currency) -> Price {
        Price::new(self.price, currency).times(self.qty)
    }
}

/// Convert a JavaScript number into a cart quantity.
///
/// NaN and infinities are rejected; fractional values truncate toward zero.
pub fn quantity_from_js(value: f64) -> Option<i64> {
    if value.is_finite() {
        Some(value.trunc() as i64)
    } else {
        None
    }
}

/// The cart store
#[derive(Debug)]
pub struct Cart<S: CartStorage> {
    items: Vec<CartItem>,
    currency: Currency,
    storage: S,
}

impl<S: CartStorage> Cart<S> {
    /// Restore the cart from storage. Missing or unreadable data gives an
    /// empty cart. Stored lines go through the same rules as [`Cart::add`].
    pub fn load(storage: S) -> Self {
        let stored = storage
            .get(CART_STORAGE_KEY)
            .map(|raw| {
                serde_json::from_str::<Vec<CartItem>>(&raw).unwrap_or_else(|e| {
                    warn!("Discarding unreadable stored cart: {}", e);
                    Vec::new()
                })
            })
            .unwrap_or_default();

        let mut cart = Self {
            items: Vec::new(),
            currency: Currency::default(),
            storage,
        };
        for item in stored {
            let qty = item.qty;
            cart.merge(item, qty);
        }
        cart
    }

    /// Builder: set the currency totals are computed in
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `qty` of an item, merging with an existing line.
    pub fn add(&mut self, item: CartItem, qty: i64) {
        if self.merge(item, qty) {
            self.persist();
        }
    }

    /// Lower a line's quantity by `step`, removing it once it reaches zero.
    pub fn decrement(&mut self, item_id: &str, step: i64) {
        if step <= 0 {
            return;
        }
        let Some(idx) = self.position(item_id) else {
            return;
        };

        self.items[idx].qty -= step;
        if self.items[idx].qty <= 0 {
            self.items.remove(idx);
        }
        self.persist();
    }

    /// Overwrite a line's quantity; zero or below removes it.
    pub fn set_qty(&mut self, item_id: &str, qty: i64) {
        if qty <= 0 {
            self.remove(item_id);
            return;
        }
        let Some(idx) = self.position(item_id) else {
            return;
        };

        self.items[idx].qty = qty;
        self.persist();
    }

    pub fn remove(&mut self, item_id: &str) {
        self.items.retain(|x| x.item_id != item_id);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    /// Number of units across all lines
    pub fn count(&self) -> i64 {
        self.items
            .iter()
            .map(|x| x.qty)
            .fold(0_i64, i64::saturating_add)
    }

    /// Sum of price × qty
    pub fn total(&self) -> Price {
        let amount = self
            .items
            .iter()
            .map(|x| x.total(self.currency).amount)
            .fold(0_i64, i64::saturating_add);
        Price::from_cents(amount, self.currency)
    }

    /// Build the request the backend expects for `POST /orders`.
    pub fn to_order_request(&self, user_id: impl Into<String>) -> CreateOrderRequest {
        let items = self
            .items
            .iter()
            .map(|x| RawItem {
                item_id: Some(x.item_id.clone()),
                name: Some(x.name.clone()),
                price: Some(NumberLike::Number(x.price)),
                quantity: Some(NumberLike::Number(x.qty as f64)),
                category: x.item_type.clone(),
                ..RawItem::default()
            })
            .collect();

        CreateOrderRequest {
            amount: Some(NumberLike::Text(self.total().value())),
            currency: Some(self.currency.code().to_string()),
            user_id: Some(user_id.into()),
            items,
        }
    }

    /// Returns false when the line was ignored
    fn merge(&mut self, item: CartItem, qty: i64) -> bool {
        if item.item_id.is_empty() || qty <= 0 {
            return false;
        }

        match self.position(&item.item_id) {
            Some(idx) => {
                let line = &mut self.items[idx];
                line.qty = line.qty.saturating_add(qty);
            }
            None => {
                let price = if item.price.is_finite() && item.price > 0.0 {
                    item.price
                } else {
                    0.0
                };
                self.items.push(CartItem { price, qty, ..item });
            }
        }
        true
    }

    fn position(&self, item_id: &str) -> Option<usize> {
        self.items.iter().position(|x| x.item_id == item_id)
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.items)
            .map_err(PaymentError::from)
            .and_then(|json| self.storage.set(CART_STORAGE_KEY, &json));

        match result {
            Ok(()) => debug!("Saved cart: {} lines", self.items.len()),
            Err(e) => warn!("Failed to persist cart: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> Cart<MemoryStorage> {
        Cart::load(MemoryStorage::new())
    }

    fn tee() -> CartItem {
        CartItem::new("tee", "T-Shirt", 10.0).with_type("physical")
    }

    #[test]
    fn test_add_merges_lines() {
        let mut cart = cart();
        cart.add(tee(), 1);
        cart.add(tee(), 2);
        cart.add(CartItem::new("mug", "Mug", 4.5), 1);

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].qty, 3);
        assert_eq!(cart.count(), 4);
        assert_eq!(cart.total().value(), "34.50");
    }

    #[test]
    fn test_add_ignores_bad_input() {
        let mut cart = cart();
        cart.add(tee(), 0);
        cart.add(tee(), -3);
        cart.add(CartItem::new("", "Nameless", 1.0), 1);

        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_sanitizes_price() {
        let mut cart = cart();
        cart.add(CartItem::new("odd", "Odd", f64::NAN), 2);
        cart.add(CartItem::new("neg", "Neg", -5.0), 1);

        assert_eq!(cart.total().amount, 0);
        assert!(cart.items().iter().all(|x| x.price == 0.0));
    }

    #[test]
    fn test_decrement_removes_at_zero() {
        let mut cart = cart();
        cart.add(tee(), 2);

        cart.decrement("tee", 1);
        assert_eq!(cart.items()[0].qty, 1);

        cart.decrement("tee", 0);
        assert_eq!(cart.items()[0].qty, 1);

        cart.decrement("tee", 5);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_qty() {
        let mut cart = cart();
        cart.add(tee(), 1);

        cart.set_qty("tee", 7);
        assert_eq!(cart.count(), 7);

        cart.set_qty("missing", 3);
        assert_eq!(cart.items().len(), 1);

        cart.set_qty("tee", 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_never_non_positive() {
        let mut cart = cart();
        cart.add(tee(), 3);
        cart.add(CartItem::new("mug", "Mug", 4.5), 1);
        cart.decrement("mug", 2);
        cart.set_qty("tee", -1);
        cart.add(tee(), 1);

        assert!(cart.items().iter().all(|x| x.qty > 0));
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn test_persists_and_reloads() {
        let mut cart = cart();
        cart.add(tee().with_image("/img/tee.png"), 2);
        cart.add(CartItem::new("mug", "Mug", 4.5), 1);
        cart.remove("mug");

        let stored = cart.storage().get(CART_STORAGE_KEY).unwrap();
        assert!(stored.contains("\"itemId\":\"tee\""));
        assert!(stored.contains("\"type\":\"physical\""));

        let reloaded = Cart::load(cart.storage().clone());
        assert_eq!(reloaded.items(), cart.items());
    }

    #[test]
    fn test_clear_persists_empty_list() {
        let mut cart = cart();
        cart.add(tee(), 1);
        cart.clear();

        assert_eq!(cart.storage().get(CART_STORAGE_KEY).as_deref(), Some("[]"));
    }

    #[test]
    fn test_corrupt_storage_gives_empty_cart() {
        let storage = MemoryStorage::new().with_entry(CART_STORAGE_KEY, "{not json");
        let cart = Cart::load(storage);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_stored_lines_are_sanitized() {
        let stored = r#"[
            {"itemId": "tee", "name": "T-Shirt", "price": 10, "qty": 1},
            {"itemId": "tee", "name": "T-Shirt", "price": 10, "qty": 2},
            {"itemId": "neg", "name": "Neg", "price": -5, "qty": 1},
            {"itemId": "", "name": "Nameless", "price": 1, "qty": 1},
            {"itemId": "gone", "name": "Gone", "price": 1, "qty": 0}
        ]"#;
        let cart = Cart::load(MemoryStorage::new().with_entry(CART_STORAGE_KEY, stored));

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].qty, 3);
        assert_eq!(cart.items()[1].price, 0.0);
        assert_eq!(cart.total().value(), "30.00");
    }

    #[test]
    fn test_huge_quantities_saturate() {
        let mut cart = cart();
        cart.add(tee(), quantity_from_js(1e300).unwrap());
        cart.add(CartItem::new("mug", "Mug", 4.5), 1);

        assert_eq!(cart.items()[0].qty, i64::MAX);
        assert_eq!(cart.count(), i64::MAX);
        assert_eq!(cart.total().amount, i64::MAX);
    }

    #[test]
    fn test_quantity_from_js() {
        assert_eq!(quantity_from_js(2.0), Some(2));
        assert_eq!(quantity_from_js(2.9), Some(2));
        assert_eq!(quantity_from_js(-1.0), Some(-1));
        assert_eq!(quantity_from_js(f64::NAN), None);
        assert_eq!(quantity_from_js(f64::INFINITY), None);
    }

    #[test]
    fn test_to_order_request() {
        let mut cart = cart();
        cart.add(tee(), 2);

        let request = cart.to_order_request("uid-42");
        assert_eq!(request.user_id.as_deref(), Some("uid-42"));
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.amount, Some(NumberLike::Text("20.00".into())));
        assert_eq!(request.currency.as_deref(), Some("EUR"));
    }
}
