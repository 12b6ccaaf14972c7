use fundamentals_core::normalize::clean_label;
use fundamentals_core::{MatchEntry, MatchTable, MetricKey, RawCell, RawTable, SynonymMap};

use crate::similarity;

/// Scores must be strictly above this to count as a match.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Similarity of a row label to a synonym; labels that are not text score 0.
pub fn label_similarity(label: &RawCell, synonym: &str) -> f64 {
    match label.as_text() {
        Some(text) => similarity::ratio(&clean_label(text), &clean_label(synonym)),
        None => 0.0,
    }
}

/// Best score of `label` against all synonyms of one metric.
pub fn best_synonym_score(label: &RawCell, synonyms: &[String]) -> f64 {
    synonyms
        .iter()
        .map(|s| label_similarity(label, s))
        .fold(0.0, f64::max)
}

/// Assigns each metric the table row whose label is most similar to one of
/// its synonyms.
///
/// Tables are scanned in order, rows top to bottom; on equal scores the
/// first row seen wins. Metrics without a score above
/// [`SIMILARITY_THRESHOLD`] are left out.
pub fn find_table_entries(tables: &[RawTable], synonyms: &SynonymMap) -> MatchTable {
    let mut best: Vec<Option<MatchEntry>> = vec![None; MetricKey::ALL.len()];

    for (table_index, table) in tables.iter().enumerate() {
        for label in table.labels() {
            let Some(text) = label.as_text() else {
                continue;
            };
            for (metric, metric_synonyms) in synonyms.iter() {
                let score = best_synonym_score(label, metric_synonyms);
                if score <= SIMILARITY_THRESHOLD {
                    continue;
                }

                let slot = &mut best[metric as usize];
                let improves = slot
                    .as_ref()
                    .map_or(true, |current| current.similarity.unwrap_or(0.0) < score);
                if improves {
                    *slot = Some(MatchEntry {
                        metric,
                        table: table_index,
                        label: text.to_string(),
                        similarity: Some(score),
                    });
                }
            }
        }
    }

    let entries: Vec<MatchEntry> = best.into_iter().flatten().collect();
    for entry in &entries {
        tracing::debug!(
            "Matched {} to '{}' in table {} (similarity {:.3})",
            entry.metric,
            entry.label,
            entry.table,
            entry.similarity.unwrap_or(0.0)
        );
    }
    MatchTable::new(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn table(labels: &[&str]) -> RawTable {
        RawTable::new(
            vec!["".into(), "2022".into()],
            labels
                .iter()
                .map(|l| vec![RawCell::from(*l), RawCell::from("1")])
                .collect(),
        )
    }

    fn synonyms(entries: &[(MetricKey, &[&str])]) -> SynonymMap {
        SynonymMap::new(
            entries
                .iter()
                .map(|(k, v)| (*k, v.iter().map(|s| s.to_string()).collect()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn test_exact_synonym_matches_with_full_score() {
        let tables = vec![table(&["Umsatz", "Mitarbeiter"])];
        let matches = find_table_entries(&tables, SynonymMap::builtin());

        let sales = matches.get(MetricKey::Sales).unwrap();
        assert_eq!(sales.table, 0);
        assert_eq!(sales.label, "Umsatz");
        assert_eq!(sales.similarity, Some(1.0));
    }

    #[test]
    fn test_no_entry_at_or_below_threshold() {
        let tables = vec![table(&["Umsatzerlöse gesamt in Tsd.", "KBV", "Personal"])];
        let matches = find_table_entries(&tables, SynonymMap::builtin());

        assert!(matches
            .entries()
            .iter()
            .all(|e| e.similarity.unwrap() > SIMILARITY_THRESHOLD));
        assert!(matches.get(MetricKey::Kgv).is_none());
        assert!(matches.get(MetricKey::EmployeeCount).is_none());
    }

    #[test]
    fn test_score_exactly_at_threshold_is_rejected() {
        let map = synonyms(&[(MetricKey::Ebit, &["EBIT"])]);
        assert_eq!(similarity::ratio("EBITDA", "EBIT"), SIMILARITY_THRESHOLD);

        let at_threshold = find_table_entries(&[table(&["EBITDA"])], &map);
        assert!(at_threshold.get(MetricKey::Ebit).is_none());

        let above = find_table_entries(&[table(&["EBITDA", "EBIT*"])], &map);
        let ebit = above.get(MetricKey::Ebit).unwrap();
        assert_eq!(ebit.label, "EBIT*");
        assert!((ebit.similarity.unwrap() - 8.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_one_entry_per_metric_highest_score_wins() {
        let tables = vec![
            table(&["Gewinn pro Aktie"]),
            table(&["Gewinn je Aktie", "Ergebnis je Aktie"]),
        ];
        let matches = find_table_entries(&tables, SynonymMap::builtin());

        let eps: Vec<_> = matches
            .entries()
            .iter()
            .filter(|e| e.metric == MetricKey::EarningsPerShare)
            .collect();
        assert_eq!(eps.len(), 1);
        assert_eq!(eps[0].table, 1);
        assert_eq!(eps[0].label, "Gewinn je Aktie");
    }

    #[test]
    fn test_ties_keep_first_seen() {
        let map = synonyms(&[(MetricKey::Kgv, &["KGV"])]);
        let tables = vec![table(&["KGV"]), table(&["KGV"])];
        let matches = find_table_entries(&tables, &map);
        assert_eq!(matches.get(MetricKey::Kgv).unwrap().table, 0);
    }

    #[test]
    fn test_non_text_labels_score_zero() {
        assert_eq!(label_similarity(&RawCell::Number(2022.0), "2022"), 0.0);
        assert_eq!(label_similarity(&RawCell::Missing, ""), 0.0);

        let tables = vec![RawTable::new(
            vec!["".into()],
            vec![vec![RawCell::Missing], vec![RawCell::Number(1.0)], vec![]],
        )];
        assert!(find_table_entries(&tables, SynonymMap::builtin()).is_empty());
    }

    #[test]
    fn test_soft_hyphen_does_not_prevent_match() {
        let tables = vec![table(&["Gesamt\u{00AD}verbindlich\u{00AD}keiten"])];
        let matches = find_table_entries(&tables, SynonymMap::builtin());
        let debt = matches.get(MetricKey::TotalDebt).unwrap();
        assert_eq!(debt.similarity, Some(1.0));
        assert_eq!(debt.label, "Gesamt\u{00AD}verbindlich\u{00AD}keiten");
    }

    #[test]
    fn test_entries_in_canonical_order() {
        let tables = vec![table(&["KGV", "Umsatz", "Dividende"])];
        let matches = find_table_entries(&tables, SynonymMap::builtin());
        let order: Vec<_> = matches.entries().iter().map(|e| e.metric).collect();
        assert_eq!(
            order,
            vec![MetricKey::Sales, MetricKey::DividendPerShare, MetricKey::Kgv]
        );
    }
}
