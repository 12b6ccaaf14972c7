use anyhow::Result;
use fundamentals_core::{
    CurrencyProvider, ExtractionError, MatchTable, RecordSet, SynonymMap, TableProvider,
};
use stock_store::StockDb;

use crate::providers::CurrencyOverride;

/// Counts of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub documents: usize,
    pub failed: usize,
    pub empty: usize,
    pub years_written: usize,
}

/// Runs documents through matching and extraction and stores the result.
pub struct Importer<'a, P> {
    provider: &'a P,
    synonyms: &'a SynonymMap,
    overrides: CurrencyOverride,
    dry_run: bool,
}

impl<'a, P> Importer<'a, P>
where
    P: TableProvider + CurrencyProvider,
{
    pub fn new(provider: &'a P, synonyms: &'a SynonymMap) -> Self {
        Self {
            provider,
            synonyms,
            overrides: CurrencyOverride::default(),
            dry_run: false,
        }
    }

    pub fn with_overrides(mut self, overrides: CurrencyOverride) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Match table for one document.
    pub async fn match_document(&self, source: &str) -> Result<MatchTable, ExtractionError> {
        let tables = self.provider.fetch_tables(source).await?;
        Ok(table_extractor::find_table_entries(&tables, self.synonyms))
    }

    /// Record set for one document, `None` when nothing could be extracted.
    pub async fn extract_document(
        &self,
        source: &str,
    ) -> Result<Option<RecordSet>, ExtractionError> {
        let tables = self.provider.fetch_tables(source).await?;
        let detected = self.provider.fetch_currencies(source, &tables).await?;
        let currencies = self.overrides.apply(detected);
        if currencies.is_none() {
            tracing::warn!("No currencies for {}, values stay unlabeled", source);
        }
        Ok(table_extractor::extract(&tables, self.synonyms, currencies.as_ref()))
    }

    /// Imports every source for `isin`. A failing source is logged and the
    /// run moves on; database errors abort.
    pub async fn import(
        &self,
        db: &StockDb,
        isin: &str,
        sources: &[String],
    ) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        for source in sources {
            summary.documents += 1;
            let records = match self.extract_document(source).await {
                Ok(Some(records)) => records,
                Ok(None) => {
                    tracing::warn!("No data extracted from {}", source);
                    summary.empty += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Error importing {}: {}", source, e);
                    summary.failed += 1;
                    continue;
                }
            };

            if self.dry_run {
                tracing::info!(
                    "{}: {} years, {} metrics (dry run)",
                    source,
                    records.len(),
                    records.columns().len()
                );
                continue;
            }
            summary.years_written += db.persist_record_set(isin, &records).await?;
        }

        if !self.dry_run {
            db.update_last_import(isin).await?;
        }
        Ok(summary)
    }
}
