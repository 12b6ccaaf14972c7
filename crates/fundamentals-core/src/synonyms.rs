use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::{ExtractionError, MetricKey};

const BUILTIN: &[(MetricKey, &[&str])] = &[
    (MetricKey::Sales, &["Umsatzerlöse in Mio.", "Umsatz", "Umsatzerlöse"]),
    (MetricKey::Ebit, &["EBIT", "EBIT in Mio.", "Ergebnis vor Steuer (EBT)"]),
    (
        MetricKey::SalesPerShare,
        &["Umsatz/Aktie", "Umsatz pro Aktie", "Umsatz je Aktie"],
    ),
    (
        MetricKey::EarningsPerShare,
        &[
            "Ergebnis/Aktie",
            "Ergebnis pro Aktie",
            "Gewinn je Aktie",
            "Ergebnis je Aktie (unverwässert, nach Steuern)",
            "Gewinn je Aktie (unverwässert, nach Steuern)",
        ],
    ),
    (
        MetricKey::BookPerShare,
        &["Buchwert/Aktie", "Buchwert je Aktie", "Buchwert pro Aktie"],
    ),
    (
        MetricKey::CashflowPerShare,
        &["Cashflow/Aktie", "Cashflow je Aktie", "Cashflow pro Aktie"],
    ),
    (MetricKey::DividendPerShare, &["Dividende", "Dividende je Aktie"]),
    (
        MetricKey::DividendYield,
        &[
            "Dividendenrendite",
            "Dividendenrendite (in %)",
            "Dividendenrendite Jahresende in %",
        ],
    ),
    (
        MetricKey::Kgv,
        &["KGV", "Kurs-Gewinn-Verhältnis", "KGV (Jahresendkurs)"],
    ),
    (MetricKey::Kcv, &["KCV", "Kurs-Cashflow-Verhältnis"]),
    (MetricKey::Kbv, &["KBV", "Kurs-Buchwert-Verhältnis"]),
    (MetricKey::Kuv, &["KUV", "Kurs-Umsatz-Verhältnis"]),
    (MetricKey::EquityRatio, &["Eigenkapitalquote"]),
    (MetricKey::TotalDebt, &["Gesamt\u{00AD}verbindlichkeiten"]),
    (MetricKey::MarketCap, &["Marktkapitalisierung"]),
    (MetricKey::StockCount, &["Anzahl der Aktien"]),
    (
        MetricKey::EmployeeCount,
        &["Anzahl der Mitarbeiter", "Personal am Jahresende"],
    ),
];

/// Known label variants for each metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynonymMap {
    entries: BTreeMap<MetricKey, Vec<String>>,
}

impl SynonymMap {
    /// German finance labels as used by boerse.de and finanzen.net.
    pub fn builtin() -> &'static SynonymMap {
        static BUILTIN_MAP: OnceLock<SynonymMap> = OnceLock::new();
        BUILTIN_MAP.get_or_init(|| {
            let entries = BUILTIN
                .iter()
                .map(|(key, labels)| (*key, labels.iter().map(|l| l.to_string()).collect()))
                .collect();
            SynonymMap { entries }
        })
    }

    pub fn new(entries: BTreeMap<MetricKey, Vec<String>>) -> Self {
        Self { entries }
    }

    /// Reads a `{"Sales": ["Umsatz", ...], ...}` map.
    pub fn from_json(json: &str) -> Result<Self, ExtractionError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ExtractionError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn get(&self, metric: MetricKey) -> &[String] {
        self.entries.get(&metric).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Metrics with at least one synonym, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (MetricKey, &[String])> {
        self.entries
            .iter()
            .filter(|(_, labels)| !labels.is_empty())
            .map(|(key, labels)| (*key, labels.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_map() {
        let map = SynonymMap::builtin();
        assert!(map.get(MetricKey::Sales).contains(&"Umsatz".to_string()));
        assert!(map.get(MetricKey::PricePerShare).is_empty());
        assert!(map.get(MetricKey::Year).is_empty());
        assert_eq!(map.iter().next().unwrap().0, MetricKey::Sales);
        assert!(std::ptr::eq(map, SynonymMap::builtin()));
    }

    #[test]
    fn test_from_json() {
        let map = SynonymMap::from_json(r#"{"KGV": ["P/E"], "Sales": ["Revenue", "Sales"]}"#)
            .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(MetricKey::Kgv), &["P/E".to_string()]);
        let order: Vec<_> = map.iter().map(|(key, _)| key).collect();
        assert_eq!(order, vec![MetricKey::Sales, MetricKey::Kgv]);
    }

    #[test]
    fn test_from_json_rejects_unknown_metric() {
        assert!(SynonymMap::from_json(r#"{"Revenue": ["Umsatz"]}"#).is_err());
    }
}
