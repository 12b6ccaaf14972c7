use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ExtractionError;

/// Canonical financial metric recognized by the pipeline.
///
/// Declaration order is the canonical column order used for match tables,
/// reports and persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricKey {
    Sales,
    SalesPerShare,
    EarningsPerShare,
    CashflowPerShare,
    BookPerShare,
    DividendPerShare,
    DividendYield,
    EquityRatio,
    MarketCap,
    #[serde(rename = "EBIT")]
    Ebit,
    TotalDebt,
    #[serde(rename = "KGV")]
    Kgv,
    #[serde(rename = "KBV")]
    Kbv,
    #[serde(rename = "KUV")]
    Kuv,
    #[serde(rename = "KCV")]
    Kcv,
    EmployeeCount,
    StockCount,
    PricePerShare,
    Year,
}

impl MetricKey {
    pub const ALL: [MetricKey; 19] = [
        MetricKey::Sales,
        MetricKey::SalesPerShare,
        MetricKey::EarningsPerShare,
        MetricKey::CashflowPerShare,
        MetricKey::BookPerShare,
        MetricKey::DividendPerShare,
        MetricKey::DividendYield,
        MetricKey::EquityRatio,
        MetricKey::MarketCap,
        MetricKey::Ebit,
        MetricKey::TotalDebt,
        MetricKey::Kgv,
        MetricKey::Kbv,
        MetricKey::Kuv,
        MetricKey::Kcv,
        MetricKey::EmployeeCount,
        MetricKey::StockCount,
        MetricKey::PricePerShare,
        MetricKey::Year,
    ];

    /// Wire name used in match tables, persisted attributes and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::Sales => "Sales",
            MetricKey::SalesPerShare => "SalesPerShare",
            MetricKey::EarningsPerShare => "EarningsPerShare",
            MetricKey::CashflowPerShare => "CashflowPerShare",
            MetricKey::BookPerShare => "BookPerShare",
            MetricKey::DividendPerShare => "DividendPerShare",
            MetricKey::DividendYield => "DividendYield",
            MetricKey::EquityRatio => "EquityRatio",
            MetricKey::MarketCap => "MarketCap",
            MetricKey::Ebit => "EBIT",
            MetricKey::TotalDebt => "TotalDebt",
            MetricKey::Kgv => "KGV",
            MetricKey::Kbv => "KBV",
            MetricKey::Kuv => "KUV",
            MetricKey::Kcv => "KCV",
            MetricKey::EmployeeCount => "EmployeeCount",
            MetricKey::StockCount => "StockCount",
            MetricKey::PricePerShare => "PricePerShare",
            MetricKey::Year => "Year",
        }
    }

    /// Metrics stored as percentages (`1.28%`).
    pub fn is_percentage(&self) -> bool {
        matches!(self, MetricKey::DividendYield | MetricKey::EquityRatio)
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKey {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        MetricKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == name)
            .ok_or_else(|| ExtractionError::UnknownMetric(name.to_string()))
    }
}

/// Three-letter currency code, e.g. `EUR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(Self(code))
        } else {
            None
        }
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::new(&value).ok_or_else(|| format!("invalid currency code: {value}"))
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

/// Currencies of a scraped page as reported by the currency metadata provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCurrencies {
    pub data_currency: Option<Currency>,
    pub sales_currency: Option<Currency>,
}

/// A cell as delivered by the table provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    Number(f64),
    Text(String),
    Missing,
}

impl RawCell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawCell::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::Text(value.to_string())
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

/// Scraped table: `headers[i]` names column `i`, column 0 holds row labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<RawCell>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn new(headers: Vec<RawCell>, rows: Vec<Vec<RawCell>>) -> Self {
        Self { headers, rows }
    }

    /// Row labels (first column), `Missing` for empty rows.
    pub fn labels(&self) -> impl Iterator<Item = &RawCell> {
        self.rows
            .iter()
            .map(|row| row.first().unwrap_or(&RawCell::Missing))
    }

    pub fn cell(&self, row: usize, column: usize) -> &RawCell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&RawCell::Missing)
    }
}

/// Accepted assignment of a metric to a table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEntry {
    pub metric: MetricKey,
    pub table: usize,
    pub label: String,
    /// Similarity score; unknown when the entry was read back from CSV.
    pub similarity: Option<f64>,
}

/// At most one [`MatchEntry`] per metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchTable {
    entries: Vec<MatchEntry>,
}

impl MatchTable {
    /// Builds a table, keeping the first entry of each metric.
    pub fn new(entries: Vec<MatchEntry>) -> Self {
        let mut table = Self::default();
        for entry in entries {
            table.push(entry);
        }
        table
    }

    pub fn push(&mut self, entry: MatchEntry) -> bool {
        if self.get(entry.metric).is_some() {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn get(&self, metric: MetricKey) -> Option<&MatchEntry> {
        self.entries.iter().find(|e| e.metric == metric)
    }

    pub fn entries(&self) -> &[MatchEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Serializes to `table;column;category` CSV.
    pub fn to_csv(&self) -> Result<String, ExtractionError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_writer(Vec::new());
        writer.write_record(["table", "column", "category"])?;
        for entry in &self.entries {
            writer.write_record([
                entry.table.to_string().as_str(),
                entry.label.as_str(),
                entry.metric.as_str(),
            ])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ExtractionError::InvalidMatchTable(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ExtractionError::InvalidMatchTable(e.to_string()))
    }

    /// Parses the `table;column;category` form. Duplicate categories keep
    /// the first row; an empty or blank input yields an empty table.
    pub fn from_csv(data: &str) -> Result<Self, ExtractionError> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes());

        let mut table = Self::default();
        for result in reader.records() {
            let record = result?;
            let table_index = record.get(0).unwrap_or("");
            let table_index: usize = table_index.parse().map_err(|_| {
                ExtractionError::InvalidMatchTable(format!("bad table index '{table_index}'"))
            })?;
            let label = record.get(1).unwrap_or("").to_string();
            let metric: MetricKey = record.get(2).unwrap_or("").parse()?;

            table.push(MatchEntry {
                metric,
                table: table_index,
                label,
                similarity: None,
            });
        }

        Ok(table)
    }
}
