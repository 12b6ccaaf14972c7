use fundamentals_core::normalize::{
    find_currency, parse_number, parse_year, strip_currency, strip_scale, Scale,
};
use fundamentals_core::{
    CellValue, Currency, MetricKey, PageCurrencies, RawCell, RawTable, YearSeries,
};

/// How cells of one metric are read: default currency and whether values
/// are quoted in millions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricPolicy {
    pub currency: Option<Currency>,
    pub multiply: bool,
}

impl MetricPolicy {
    pub fn for_metric(metric: MetricKey, currencies: Option<&PageCurrencies>) -> Self {
        let data_currency = currencies.and_then(|c| c.data_currency.clone());
        let sales_currency = currencies.and_then(|c| c.sales_currency.clone());

        match metric {
            MetricKey::Sales => Self {
                currency: sales_currency,
                multiply: true,
            },
            MetricKey::Ebit | MetricKey::TotalDebt | MetricKey::MarketCap => Self {
                currency: data_currency,
                multiply: true,
            },
            MetricKey::StockCount => Self {
                currency: None,
                multiply: true,
            },
            MetricKey::DividendPerShare
            | MetricKey::SalesPerShare
            | MetricKey::BookPerShare
            | MetricKey::CashflowPerShare
            | MetricKey::EarningsPerShare => Self {
                currency: data_currency,
                multiply: false,
            },
            _ => Self::default(),
        }
    }
}

/// Reads one table row into a year series.
///
/// Only columns whose header reads as a year are considered; cells that do
/// not parse are skipped without affecting the rest of the row.
pub fn parse_row(
    table: &RawTable,
    row: usize,
    metric: MetricKey,
    policy: &MetricPolicy,
) -> YearSeries {
    let mut series = YearSeries::new(metric);
    let mut currency = policy.currency.clone();

    for (column, header) in table.headers.iter().enumerate().skip(1) {
        let Some(year) = parse_year(header) else {
            continue;
        };

        let cell = table.cell(row, column);
        match normalize_cell(cell, metric, policy.multiply, &mut currency) {
            Some(value) => {
                if !series.insert(year, value) {
                    tracing::debug!("{}: duplicate column for {}, keeping first", metric, year);
                }
            }
            None => tracing::debug!("{}: skipping unreadable cell {:?} for {}", metric, cell, year),
        }
    }

    series
}

/// Normalizes one cell. A currency code found in the text replaces
/// `currency` for this and all later cells of the row.
pub fn normalize_cell(
    cell: &RawCell,
    metric: MetricKey,
    multiply: bool,
    currency: &mut Option<Currency>,
) -> Option<CellValue> {
    let (value, scale) = match cell {
        RawCell::Number(v) if v.is_finite() => (*v, None),
        RawCell::Text(text) => {
            let embedded = find_currency(text);
            let text = strip_currency(text, embedded.as_ref());
            if embedded.is_some() {
                *currency = embedded;
            }
            let (text, scale) = strip_scale(&text);
            (parse_number(&text)?, scale)
        }
        _ => return None,
    };

    let value = if multiply { scale_value(value, scale) } else { value };

    if metric.is_percentage() {
        return Some(CellValue::Percent(value));
    }
    // a share count of 0 is a scraping artifact
    if metric == MetricKey::StockCount && value == 0.0 {
        return Some(CellValue::Empty);
    }
    Some(CellValue::amount(value, currency.clone()))
}

/// Figures are quoted in millions unless marked as billions.
fn scale_value(value: f64, scale: Option<Scale>) -> f64 {
    let factor = match scale {
        Some(Scale::Billion) => Scale::Billion.factor(),
        _ => Scale::Million.factor(),
    };
    (value * factor).round()
}
