//! Table Extractor
//!
//! Turns scraped financial tables into a year-indexed record set: row labels
//! are matched to canonical metrics, matched rows are normalized into year
//! series and the series are merged on year.

pub mod matcher;
pub mod merge;
pub mod row_parser;
pub mod similarity;

use fundamentals_core::normalize::clean_label;
use fundamentals_core::{
    ExtractionError, MatchTable, PageCurrencies, RawTable, RecordSet, SynonymMap, YearSeries,
};

pub use matcher::{find_table_entries, SIMILARITY_THRESHOLD};
pub use merge::merge_series;
pub use row_parser::{normalize_cell, parse_row, MetricPolicy};

/// Builds the record set for the rows named in `match_table`.
///
/// Returns `None` when the match table is empty or no matched row has a
/// readable year column. Entries pointing at a missing table or label are
/// logged and skipped.
pub fn create_record_set(
    tables: &[RawTable],
    match_table: &MatchTable,
    currencies: Option<&PageCurrencies>,
) -> Option<RecordSet> {
    if match_table.is_empty() {
        return None;
    }

    let mut series: Vec<YearSeries> = Vec::with_capacity(match_table.len());
    for entry in match_table.entries() {
        let Some(table) = tables.get(entry.table) else {
            tracing::warn!(
                "Table {} for {} not found ({} tables)",
                entry.table,
                entry.metric,
                tables.len()
            );
            continue;
        };

        let wanted = clean_label(&entry.label);
        let row = table
            .labels()
            .position(|label| label.as_text().is_some_and(|l| clean_label(l) == wanted));
        let Some(row) = row else {
            let labels: Vec<String> = table
                .labels()
                .filter_map(|l| l.as_text().map(clean_label))
                .collect();
            tracing::warn!("Didn't find '{}' in {:?}", wanted, labels);
            continue;
        };

        let policy = MetricPolicy::for_metric(entry.metric, currencies);
        let parsed = parse_row(table, row, entry.metric, &policy);
        tracing::debug!("{}: {} years from table {}", entry.metric, parsed.len(), entry.table);
        series.push(parsed);
    }

    merge_series(&series)
}

/// Same as [`create_record_set`] for a `table;column;category` CSV match table.
pub fn create_record_set_from_csv(
    tables: &[RawTable],
    match_csv: &str,
    currencies: Option<&PageCurrencies>,
) -> Result<Option<RecordSet>, ExtractionError> {
    let match_table = MatchTable::from_csv(match_csv)?;
    Ok(create_record_set(tables, &match_table, currencies))
}

/// Matches and extracts in one step.
pub fn extract(
    tables: &[RawTable],
    synonyms: &SynonymMap,
    currencies: Option<&PageCurrencies>,
) -> Option<RecordSet> {
    let match_table = find_table_entries(tables, synonyms);
    tracing::info!("Matched {} metrics in {} tables", match_table.len(), tables.len());
    create_record_set(tables, &match_table, currencies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundamentals_core::{CellValue, Currency, MetricKey, RawCell};

    fn text_row(cells: &[&str]) -> Vec<RawCell> {
        cells.iter().map(|c| RawCell::from(*c)).collect()
    }

    fn guv_table() -> RawTable {
        RawTable::new(
            text_row(&["", "2019", "2020", "2021"]),
            vec![
                text_row(&["Umsatz", "1.000,0", "1.100,0", "1.250,5"]),
                text_row(&["Gewinn je Aktie", "1,50", "1,75", "2,00"]),
                text_row(&["Anzahl der Aktien", "0", "350", "0"]),
            ],
        )
    }

    fn ratio_table() -> RawTable {
        RawTable::new(
            text_row(&["", "20/21", "21/22", "22/23e"]),
            vec![
                text_row(&["KGV", "12,0", "11,0", "10,0"]),
                text_row(&["Dividenden\u{00AD}rendite", "1,2 %", "1,4", "-"]),
            ],
        )
    }

    fn currencies() -> PageCurrencies {
        PageCurrencies {
            data_currency: Currency::new("EUR"),
            sales_currency: Currency::new("EUR"),
        }
    }

    #[test]
    fn test_extract_end_to_end() {
        let tables = vec![guv_table(), ratio_table()];
        let records = extract(&tables, SynonymMap::builtin(), Some(&currencies())).unwrap();
        let eur = Currency::new("EUR").unwrap();

        assert_eq!(records.years(), vec![2019, 2020, 2021, 2022, 2023]);
        assert_eq!(
            records.get(2021, MetricKey::Sales),
            &CellValue::money(1_250_500_000.0, eur.clone())
        );
        assert_eq!(
            records.get(2020, MetricKey::EarningsPerShare),
            &CellValue::money(1.75, eur)
        );
        assert!(records.get(2019, MetricKey::StockCount).is_empty());
        assert_eq!(
            records.get(2020, MetricKey::StockCount),
            &CellValue::Number(350_000_000.0)
        );
        assert_eq!(records.get(2022, MetricKey::Kgv), &CellValue::Number(11.0));
        assert_eq!(records.get(2021, MetricKey::DividendYield), &CellValue::Percent(1.2));
        assert!(records.get(2023, MetricKey::DividendYield).is_empty());
        assert!(records.get(2019, MetricKey::Kgv).is_empty());
    }

    #[test]
    fn test_empty_match_table_is_no_data() {
        let tables = vec![guv_table()];
        assert!(create_record_set(&tables, &MatchTable::default(), None).is_none());
        assert!(extract(&[], SynonymMap::builtin(), None).is_none());
    }

    #[test]
    fn test_missing_label_is_skipped() {
        let tables = vec![guv_table()];
        let csv = "table;column;category\n0;Umsatzerlöse;Sales\n0;Gewinn je Aktie;EarningsPerShare\n3;KGV;KGV\n";
        let records = create_record_set_from_csv(&tables, csv, None).unwrap().unwrap();

        assert_eq!(records.columns(), &[MetricKey::EarningsPerShare]);
        assert_eq!(records.get(2021, MetricKey::EarningsPerShare), &CellValue::Number(2.0));
    }

    #[test]
    fn test_csv_with_unknown_category_fails() {
        let csv = "table;column;category\n0;Umsatz;Turnover\n";
        assert!(create_record_set_from_csv(&[guv_table()], csv, None).is_err());
    }

    #[test]
    fn test_match_table_round_trip_drives_extraction() {
        let tables = vec![guv_table(), ratio_table()];
        let csv = find_table_entries(&tables, SynonymMap::builtin()).to_csv().unwrap();
        let from_csv = create_record_set_from_csv(&tables, &csv, Some(&currencies()))
            .unwrap()
            .unwrap();
        let direct = extract(&tables, SynonymMap::builtin(), Some(&currencies())).unwrap();
        assert_eq!(from_csv, direct);
    }
}
