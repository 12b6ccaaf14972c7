use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::types::MetricKey;
use crate::value::CellValue;

/// Values of one metric keyed by year, in the order the source table lists them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSeries {
    pub metric: MetricKey,
    values: Vec<(i32, CellValue)>,
}

impl YearSeries {
    pub fn new(metric: MetricKey) -> Self {
        Self {
            metric,
            values: Vec::new(),
        }
    }

    /// Records `value` for `year`; a year already present keeps its first value.
    pub fn insert(&mut self, year: i32, value: CellValue) -> bool {
        if self.values.iter().any(|(y, _)| *y == year) {
            return false;
        }
        self.values.push((year, value));
        true
    }

    pub fn get(&self, year: i32) -> Option<&CellValue> {
        self.values.iter().find(|(y, _)| *y == year).map(|(_, v)| v)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.values.iter().map(|(y, _)| *y)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(i32, CellValue)> {
        self.values.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Year-indexed table with one column per metric.
///
/// Rows are kept in ascending year order; columns in the order they were
/// added. A cell that was never written reads as [`CellValue::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<MetricKey>,
    rows: BTreeMap<i32, HashMap<MetricKey, CellValue>>,
}

static EMPTY: CellValue = CellValue::Empty;

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[MetricKey] {
        &self.columns
    }

    pub fn has_column(&self, metric: MetricKey) -> bool {
        self.columns.contains(&metric)
    }

    pub fn add_column(&mut self, metric: MetricKey) {
        if !self.has_column(metric) {
            self.columns.push(metric);
        }
    }

    pub fn years(&self) -> Vec<i32> {
        self.rows.keys().copied().collect()
    }

    pub fn add_year(&mut self, year: i32) {
        self.rows.entry(year).or_default();
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, year: i32, metric: MetricKey) -> &CellValue {
        self.rows
            .get(&year)
            .and_then(|row| row.get(&metric))
            .unwrap_or(&EMPTY)
    }

    /// Writes one cell, creating the row and column if needed.
    pub fn set(&mut self, year: i32, metric: MetricKey, value: CellValue) {
        self.add_column(metric);
        let row = self.rows.entry(year).or_default();
        if value.is_empty() {
            row.remove(&metric);
        } else {
            row.insert(metric, value);
        }
    }

    /// Values of one column in ascending year order.
    pub fn column(&self, metric: MetricKey) -> Vec<(i32, &CellValue)> {
        self.rows
            .iter()
            .map(|(year, row)| (*year, row.get(&metric).unwrap_or(&EMPTY)))
            .collect()
    }

    /// Non-empty cells of one year.
    pub fn row(&self, year: i32) -> Vec<(MetricKey, &CellValue)> {
        let Some(row) = self.rows.get(&year) else {
            return Vec::new();
        };
        self.columns
            .iter()
            .filter_map(|metric| row.get(metric).map(|value| (*metric, value)))
            .collect()
    }

    /// Outer-joins a series on year. Cells that already hold a value for the
    /// series' metric are left alone; an empty series changes nothing.
    pub fn merge_series(&mut self, series: &YearSeries) {
        if series.is_empty() {
            return;
        }
        self.add_column(series.metric);
        for (year, value) in series.iter() {
            let row = self.rows.entry(*year).or_default();
            if !value.is_empty() {
                row.entry(series.metric).or_insert_with(|| value.clone());
            }
        }
    }

    /// Fills empty cells of `metric` with the closest earlier non-empty value.
    pub fn forward_fill(&mut self, metric: MetricKey) {
        let mut last: Option<CellValue> = None;
        for row in self.rows.values_mut() {
            match row.get(&metric) {
                Some(value) if !is_missing(value) => last = Some(value.clone()),
                _ => {
                    if let Some(previous) = &last {
                        row.insert(metric, previous.clone());
                    }
                }
            }
        }
    }

    pub fn forward_fill_all(&mut self) {
        for metric in self.columns.clone() {
            self.forward_fill(metric);
        }
    }
}

fn is_missing(value: &CellValue) -> bool {
    value.is_empty() || value.as_f64().is_some_and(f64::is_nan)
}
