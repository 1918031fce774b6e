//! # checkout-wasm
//!
//! WebAssembly bindings for the storefront cart.
//!
//! This crate provides:
//! - `WasmCart`, the cart store persisted to `localStorage` under `cart:v1`
//! - Building the `POST /orders` body from the cart
//! - Price formatting helpers
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmCart } from 'storefront-checkout-wasm';
//!
//! await init();
//!
//! const cart = new WasmCart('EUR');
//! cart.add({ itemId: 'tee', name: 'T-Shirt', price: 10 }, 2);
//!
//! console.log(cart.count, cart.total); // 2 "20.00"
//! await fetch('/api/paypal/orders', {
//!   method: 'POST',
//!   headers: { 'Content-Type': 'application/json' },
//!   body: JSON.stringify(cart.orderRequest(userId)),
//! });
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

use checkout_core::{
    quantity_from_js, Cart, CartItem, CartStorage, Currency, PaymentError, PaymentResult, Price,
};
use wasm_bindgen::prelude::*;

/// Browser `localStorage`
pub struct LocalStorage {
    storage: Option<web_sys::Storage>,
}

impl LocalStorage {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        Self { storage }
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStorage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> PaymentResult<()> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| PaymentError::Storage("localStorage unavailable".to_string()))?;
        storage
            .set_item(key, value)
            .map_err(|e| PaymentError::Storage(format!("{:?}", e)))
    }
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Cart store exposed to JavaScript
#[wasm_bindgen]
pub struct WasmCart {
    inner: Cart<LocalStorage>,
}

#[wasm_bindgen]
impl WasmCart {
    /// Restore the cart from `localStorage`. `currency` defaults to EUR.
    #[wasm_bindgen(constructor)]
    pub fn new(currency: Option<String>) -> Result<WasmCart, JsValue> {
        let currency = match currency {
            Some(code) => code.parse::<Currency>().map_err(to_js_error)?,
            None => Currency::default(),
        };
        Ok(Self {
            inner: Cart::load(LocalStorage::new()).with_currency(currency),
        })
    }

    /// Add `qty` (default 1) of `{itemId, name, price, image, type}`.
    /// Non-finite or non-positive quantities are ignored.
    pub fn add(&mut self, item: JsValue, qty: Option<f64>) -> Result<(), JsValue> {
        let item: CartItem = serde_wasm_bindgen::from_value(item)
            .map_err(|e| JsValue::from_str(&format!("Invalid cart item: {}", e)))?;
        if let Some(qty) = quantity_from_js(qty.unwrap_or(1.0)) {
            self.inner.add(item, qty);
        }
        Ok(())
    }

    pub fn decrement(&mut self, item_id: &str, step: Option<f64>) {
        if let Some(step) = quantity_from_js(step.unwrap_or(1.0)) {
            self.inner.decrement(item_id, step);
        }
    }

    #[wasm_bindgen(js_name = setQty)]
    pub fn set_qty(&mut self, item_id: &str, qty: f64) {
        if let Some(qty) = quantity_from_js(qty) {
            self.inner.set_qty(item_id, qty);
        }
    }

    pub fn remove(&mut self, item_id: &str) {
        self.inner.remove(item_id);
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Number of units in the cart
    #[wasm_bindgen(getter)]
    pub fn count(&self) -> f64 {
        self.inner.count() as f64
    }

    /// Cart total as a fixed-decimal string ("20.00")
    #[wasm_bindgen(getter)]
    pub fn total(&self) -> String {
        self.inner.total().value()
    }

    /// Snapshot of the cart lines
    pub fn items(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.items()).map_err(to_js_error)
    }

    /// Body for `POST /api/paypal/orders`
    #[wasm_bindgen(js_name = orderRequest)]
    pub fn order_request(&self, user_id: String) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.to_order_request(user_id)).map_err(to_js_error)
    }
}

/// Total of a plain list of cart items, in minor units
pub fn cart_total_minor(items: &[CartItem], currency: Currency) -> i64 {
    items
        .iter()
        .filter(|item| item.qty > 0)
        .map(|item| item.total(currency).amount)
        .fold(0_i64, i64::saturating_add)
}

/// Calculate the total for a list of cart items, as a fixed-decimal string
#[wasm_bindgen(js_name = calculateCartTotal)]
pub fn calculate_cart_total(items: JsValue, currency: Option<String>) -> Result<String, JsValue> {
    let items: Vec<CartItem> = serde_wasm_bindgen::from_value(items)
        .map_err(|e| JsValue::from_str(&format!("Invalid cart items: {}", e)))?;
    let currency = match currency {
        Some(code) => code.parse::<Currency>().map_err(to_js_error)?,
        None => Currency::default(),
    };

    Ok(currency.format_minor(cart_total_minor(&items, currency)))
}

/// Format a decimal price for display ("€10.00")
#[wasm_bindgen(js_name = formatPrice)]
pub fn format_price(amount: f64, currency: &str) -> Result<String, JsValue> {
    let currency = currency.parse::<Currency>().map_err(to_js_error)?;
    Ok(Price::new(amount, currency).display())
}

/// Validate an item ID format
#[wasm_bindgen(js_name = validateItemId)]
pub fn validate_item_id(item_id: &str) -> bool {
    !item_id.is_empty()
        && item_id.len() <= 127
        && item_id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
