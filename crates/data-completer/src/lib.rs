//! Data Completer
//!
//! Fills gaps in a year-indexed record set by deriving price per share,
//! price/book, sales per share and price/sales from the metrics that are
//! present, then carrying values forward into empty years.

use fundamentals_core::normalize::round_to;
use fundamentals_core::{CellValue, MetricKey, RecordSet};

/// Runs every derivation in dependency order and forward-fills the result.
pub fn complete(mut records: RecordSet) -> RecordSet {
    calculate_stock_count(&mut records);
    calculate_pps(&mut records);
    calculate_kbv(&mut records);
    calculate_sps(&mut records);
    calculate_kuv(&mut records);
    records.forward_fill_all();
    records
}

/// Drops zero share counts and carries the last known count forward.
pub fn calculate_stock_count(records: &mut RecordSet) {
    if !records.has_column(MetricKey::StockCount) {
        return;
    }

    for year in records.years() {
        if records.get(year, MetricKey::StockCount).as_f64() == Some(0.0) {
            records.set(year, MetricKey::StockCount, CellValue::Empty);
        }
    }
    records.forward_fill(MetricKey::StockCount);
}

/// Price per share = earnings per share × P/E, in the currency of the EPS
/// with two decimals.
pub fn calculate_pps(records: &mut RecordSet) {
    derive(
        records,
        MetricKey::PricePerShare,
        (MetricKey::EarningsPerShare, MetricKey::Kgv),
        |eps, kgv| {
            let value = eps.valid_f64()? * kgv.valid_f64()?;
            Some(CellValue::amount_fixed(round_to(value, 2), eps.currency().cloned(), 2))
        },
    );
}

/// Price/book = price per share ÷ book value per share.
pub fn calculate_kbv(records: &mut RecordSet) {
    derive(
        records,
        MetricKey::Kbv,
        (MetricKey::PricePerShare, MetricKey::BookPerShare),
        ratio,
    );
}

/// Sales per share = sales ÷ share count, in the currency of the sales
/// with two decimals.
pub fn calculate_sps(records: &mut RecordSet) {
    derive(
        records,
        MetricKey::SalesPerShare,
        (MetricKey::Sales, MetricKey::StockCount),
        |sales, count| {
            let value = sales.valid_f64()? / count.valid_f64()?;
            Some(CellValue::amount_fixed(round_to(value, 2), sales.currency().cloned(), 2))
        },
    );
}

/// Price/sales = price per share ÷ sales per share.
pub fn calculate_kuv(records: &mut RecordSet) {
    derive(
        records,
        MetricKey::Kuv,
        (MetricKey::PricePerShare, MetricKey::SalesPerShare),
        ratio,
    );
}

fn ratio(numerator: &CellValue, denominator: &CellValue) -> Option<CellValue> {
    let value = numerator.valid_f64()? / denominator.valid_f64()?;
    Some(CellValue::Number(round_to(value, 2)))
}

/// Writes `target` for every year where `compute` succeeds on the two input
/// cells; other years keep what they had. Skipped entirely unless both input
/// columns exist.
fn derive<F>(records: &mut RecordSet, target: MetricKey, inputs: (MetricKey, MetricKey), compute: F)
where
    F: Fn(&CellValue, &CellValue) -> Option<CellValue>,
{
    let (left, right) = inputs;
    if !records.has_column(left) || !records.has_column(right) {
        return;
    }

    records.add_column(target);
    let mut derived = 0usize;
    for year in records.years() {
        let value = compute(records.get(year, left), records.get(year, right));
        if let Some(value) = value {
            records.set(year, target, value);
            derived += 1;
        }
    }
    tracing::debug!("Derived {} from {} and {} for {} years", target, left, right, derived);
}
