use std::collections::BTreeMap;

use fundamentals_core::{CellValue, MetricKey, RecordSet};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Attribute value handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Number(Decimal),
    /// Currency or percent tagged value, e.g. `1200.5 EUR` or `1.28%`.
    Text(String),
}

impl StoredValue {
    pub fn to_db_string(&self) -> String {
        match self {
            StoredValue::Number(d) => d.to_string(),
            StoredValue::Text(s) => s.clone(),
        }
    }
}

/// One year of a record set with only the attributes that hold a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem {
    pub year: i32,
    pub attributes: BTreeMap<String, StoredValue>,
}

impl StoredItem {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Converts a record set into sparse per-year items. Empty and non-finite
/// values and the `Year` column are left out.
pub fn to_items(records: &RecordSet) -> Vec<StoredItem> {
    records
        .years()
        .into_iter()
        .map(|year| {
            let attributes = records
                .row(year)
                .into_iter()
                .filter(|(metric, _)| *metric != MetricKey::Year)
                .filter_map(|(metric, value)| {
                    stored_value(value).map(|v| (metric.as_str().to_string(), v))
                })
                .collect();
            StoredItem { year, attributes }
        })
        .collect()
}

fn stored_value(value: &CellValue) -> Option<StoredValue> {
    if !value.as_f64().is_some_and(f64::is_finite) {
        return None;
    }
    match value {
        CellValue::Number(v) => Decimal::from_f64(*v).map(StoredValue::Number),
        other => Some(StoredValue::Text(other.to_string())),
    }
}
