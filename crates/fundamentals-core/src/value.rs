use std::fmt;

use serde::{Serialize, Serializer};

use crate::normalize;
use crate::types::Currency;

/// Normalized value of one (year, metric) cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Money {
        amount: f64,
        currency: Currency,
        /// Fixed number of decimals in the display form, shortest form if unset.
        decimals: Option<u8>,
    },
    Percent(f64),
}

impl CellValue {
    pub fn money(amount: f64, currency: Currency) -> Self {
        CellValue::Money {
            amount,
            currency,
            decimals: None,
        }
    }

    /// Money shown with exactly `decimals` decimals, e.g. `20.00 EUR`.
    pub fn money_fixed(amount: f64, currency: Currency, decimals: u8) -> Self {
        CellValue::Money {
            amount,
            currency,
            decimals: Some(decimals),
        }
    }

    /// Number tagged with `currency` when one is known.
    pub fn amount(amount: f64, currency: Option<Currency>) -> Self {
        match currency {
            Some(currency) => CellValue::money(amount, currency),
            None => CellValue::Number(amount),
        }
    }

    /// Like [`CellValue::amount`], with a fixed number of decimals when the
    /// value carries a currency.
    pub fn amount_fixed(amount: f64, currency: Option<Currency>, decimals: u8) -> Self {
        match currency {
            Some(currency) => CellValue::money_fixed(amount, currency, decimals),
            None => CellValue::Number(amount),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(v) | CellValue::Percent(v) => Some(*v),
            CellValue::Money { amount, .. } => Some(*amount),
        }
    }

    /// The numeric value if it is present, not NaN and not zero.
    ///
    /// Zero is a scraping artifact in the source tables, so every derivation
    /// treats it like a missing value.
    pub fn valid_f64(&self) -> Option<f64> {
        self.as_f64().filter(|v| !v.is_nan() && *v != 0.0)
    }

    pub fn currency(&self) -> Option<&Currency> {
        match self {
            CellValue::Money { currency, .. } => Some(currency),
            _ => None,
        }
    }

    /// Parses the display form back (`1200.5 EUR`, `1.28%`, `3.5`).
    /// Anything that does not read as a number becomes `Empty`.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return CellValue::Empty;
        }

        let is_percent = text.contains('%');
        let currency = normalize::find_currency(text);
        let stripped = normalize::strip_currency(text, currency.as_ref());

        match normalize::parse_number(&stripped) {
            Some(v) if is_percent => CellValue::Percent(v),
            Some(v) => CellValue::amount(v, currency),
            None => CellValue::Empty,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Money {
                amount,
                currency,
                decimals: Some(decimals),
            } => write!(f, "{amount:.prec$} {currency}", prec = *decimals as usize),
            CellValue::Money {
                amount, currency, ..
            } => write!(f, "{amount} {currency}"),
            CellValue::Percent(v) => write!(f, "{v}%"),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Number(v) if v.is_finite() => serializer.serialize_f64(*v),
            CellValue::Number(_) => serializer.serialize_none(),
            other => serializer.collect_str(other),
        }
    }
}
