//! # Currency & Price
//!
//! Money handling for the checkout. All arithmetic happens in the smallest
//! currency unit (`i64`); decimals only appear at the edges, when a price is
//! read from JSON or rendered for the processor.

use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Currencies accepted by the processor (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[serde(alias = "usd")]
    USD,
    #[serde(alias = "eur")]
    EUR,
    #[serde(alias = "gbp")]
    GBP,
    #[serde(alias = "jpy")]
    JPY,
    #[serde(alias = "cad")]
    CAD,
    #[serde(alias = "aud")]
    AUD,
    #[serde(alias = "chf")]
    CHF,
    #[serde(alias = "mxn")]
    MXN,
}

impl Currency {
    /// Returns the ISO 4217 code as the processor expects it
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::CHF => "CHF",
            Currency::MXN => "MXN",
        }
    }

    /// Returns the number of decimal places for this currency
    /// (JPY has 0 decimals, the others have 2)
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    fn minor_per_major(&self) -> i64 {
        10_i64.pow(self.decimal_places() as u32)
    }

    /// Convert a decimal amount to the smallest currency unit, rounding to
    /// the currency's precision.
    pub fn to_smallest_unit(&self, amount: f64) -> i64 {
        let multiplier = self.minor_per_major() as f64;
        (amount * multiplier).round() as i64
    }

    /// Convert from smallest unit back to decimal
    pub fn from_smallest_unit(&self, amount: i64) -> f64 {
        amount as f64 / self.minor_per_major() as f64
    }

    /// Render a minor-unit amount as a fixed-decimal string ("20.00", "1000").
    pub fn format_minor(&self, amount: i64) -> String {
        let places = self.decimal_places() as usize;
        if places == 0 {
            return amount.to_string();
        }
        let divisor = self.minor_per_major();
        let sign = if amount < 0 { "-" } else { "" };
        let abs = amount.unsigned_abs();
        format!(
            "{}{}.{:0width$}",
            sign,
            abs / divisor as u64,
            abs % divisor as u64,
            width = places
        )
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::EUR
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "JPY" => Ok(Currency::JPY),
            "CAD" => Ok(Currency::CAD),
            "AUD" => Ok(Currency::AUD),
            "CHF" => Ok(Currency::CHF),
            "MXN" => Ok(Currency::MXN),
            _ => Err(PaymentError::UnsupportedCurrency {
                currency: s.to_string(),
            }),
        }
    }
}

/// Price with amount in smallest currency unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in smallest currency unit (cents for EUR)
    pub amount: i64,
    /// Currency
    pub currency: Currency,
}

impl Price {
    /// Create a new price from decimal amount
    pub fn new(amount: f64, currency: Currency) -> Self {
        Self {
            amount: currency.to_smallest_unit(amount),
            currency,
        }
    }

    /// Create a price from smallest unit (cents)
    pub fn from_cents(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Multiply by a quantity, saturating instead of overflowing
    pub fn times(&self, quantity: i64) -> Self {
        Self::from_cents(self.amount.saturating_mul(quantity), self.currency)
    }

    /// Fixed-decimal value string as sent to the processor
    pub fn value(&self) -> String {
        self.currency.format_minor(self.amount)
    }

    /// Format for display (e.g., "€10.00")
    pub fn display(&self) -> String {
        let symbol = match self.currency {
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::JPY => "¥",
            Currency::CAD => "C$",
            Currency::AUD => "A$",
            Currency::CHF => "CHF ",
            Currency::MXN => "MX$",
        };
        format!("{}{}", symbol, self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_conversion() {
        let usd = Currency::USD;
        assert_eq!(usd.to_smallest_unit(10.99), 1099);
        assert_eq!(usd.from_smallest_unit(1099), 10.99);

        let jpy = Currency::JPY;
        assert_eq!(jpy.to_smallest_unit(1000.0), 1000);
        assert_eq!(jpy.from_smallest_unit(1000), 1000.0);
    }

    #[test]
    fn test_format_minor() {
        assert_eq!(Currency::EUR.format_minor(2000), "20.00");
        assert_eq!(Currency::EUR.format_minor(5), "0.05");
        assert_eq!(Currency::EUR.format_minor(-250), "-2.50");
        assert_eq!(Currency::JPY.format_minor(1500), "1500");
    }

    #[test]
    fn test_parse_currency() {
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::EUR);
        assert_eq!(" USD ".parse::<Currency>().unwrap(), Currency::USD);
        assert!(matches!(
            "XYZ".parse::<Currency>(),
            Err(PaymentError::UnsupportedCurrency { .. })
        ));
    }

    #[test]
    fn test_currency_serde_codes() {
        assert_eq!(serde_json::to_string(&Currency::GBP).unwrap(), "\"GBP\"");
        let parsed: Currency = serde_json::from_str("\"gbp\"").unwrap();
        assert_eq!(parsed, Currency::GBP);
    }

    #[test]
    fn test_price_display() {
        let price = Price::new(29.99, Currency::USD);
        assert_eq!(price.display(), "$29.99");
        assert_eq!(price.times(3).value(), "89.97");

        let price_eur = Price::new(19.99, Currency::EUR);
        assert_eq!(price_eur.display(), "€19.99");
    }
}
