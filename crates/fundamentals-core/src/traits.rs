use async_trait::async_trait;
use crate::{ExtractionError, PageCurrencies, RawTable};

/// Source of scraped tables for a document (a page URL, a file, ...).
#[async_trait]
pub trait TableProvider: Send + Sync {
    async fn fetch_tables(&self, source: &str) -> Result<Vec<RawTable>, ExtractionError>;
}

/// Detects the currencies a document reports its figures in.
#[async_trait]
pub trait CurrencyProvider: Send + Sync {
    async fn fetch_currencies(
        &self,
        source: &str,
        tables: &[RawTable],
    ) -> Result<Option<PageCurrencies>, ExtractionError>;
}
