use fundamentals_core::{RecordSet, YearSeries};

/// Outer-joins per-metric series on year. Returns `None` when no series
/// holds any year.
pub fn merge_series(series: &[YearSeries]) -> Option<RecordSet> {
    let mut records = RecordSet::new();
    for s in series.iter().filter(|s| !s.is_empty()) {
        tracing::debug!("Merging {} ({} years)", s.metric, s.len());
        records.merge_series(s);
    }

    if records.is_empty() {
        None
    } else {
        Some(records)
    }
}
