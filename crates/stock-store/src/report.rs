use fundamentals_core::{MetricKey, RecordSet};

use crate::StoreError;

/// Metrics listed in the report, top to bottom.
pub const REPORT_FIELDS: [MetricKey; 18] = [
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
];

/// Inclusive range of years shown in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub first: i32,
    pub last: i32,
}

impl ReportWindow {
    pub fn around(year: i32, years_back: i32, years_ahead: i32) -> Self {
        Self {
            first: year - years_back,
            last: year + years_ahead,
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.first..=self.last).contains(&year)
    }
}

/// Renders metrics as rows and years as columns, `;` separated with every
/// field quoted and decimal commas.
pub fn render_report(records: &RecordSet, window: &ReportWindow) -> Result<String, StoreError> {
    let years: Vec<i32> = records
        .years()
        .into_iter()
        .filter(|year| window.contains(*year))
        .collect();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    let mut header = vec![String::new()];
    header.extend(years.iter().map(|y| y.to_string()));
    writer.write_record(&header)?;

    for metric in REPORT_FIELDS {
        let mut row = vec![metric.as_str().to_string()];
        row.extend(
            years
                .iter()
                .map(|year| records.get(*year, metric).to_string().replace('.', ",")),
        );
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| StoreError::Report(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| StoreError::Report(e.to_string()))
}
