use std::collections::HashMap;

use async_trait::async_trait;
use fundamentals_core::{
    CurrencyProvider, Currency, ExtractionError, PageCurrencies, RawTable, TableProvider,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Tables scraped from one page, as written by the scraper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedDocument {
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub currencies: Option<PageCurrencies>,
    pub tables: Vec<RawTable>,
}

impl ScrapedDocument {
    pub fn from_json(json: &str) -> Result<Self, ExtractionError> {
        serde_json::from_str(json).map_err(|e| ExtractionError::Provider(e.to_string()))
    }
}

/// Reads scraped documents from JSON files; the source is the file path.
/// Each file is read once, tables and currencies come from the same read.
#[derive(Debug, Default)]
pub struct JsonTableProvider {
    documents: RwLock<HashMap<String, ScrapedDocument>>,
}

impl JsonTableProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&self, source: &str) -> Result<ScrapedDocument, ExtractionError> {
        if let Some(document) = self.documents.read().await.get(source) {
            return Ok(document.clone());
        }

        let document = Self::read_file(source).await?;
        self.documents.write().await.insert(source.to_string(), document.clone());
        Ok(document)
    }

    async fn read_file(source: &str) -> Result<ScrapedDocument, ExtractionError> {
        let json = tokio::fs::read_to_string(source).await?;
        let document = ScrapedDocument::from_json(&json)
            .map_err(|e| ExtractionError::Provider(format!("{}: {}", source, e)))?;
        tracing::debug!(
            "Loaded {} tables from {} ({})",
            document.tables.len(),
            source,
            document.source_url.as_deref().unwrap_or("unknown url")
        );
        Ok(document)
    }
}

#[async_trait]
impl TableProvider for JsonTableProvider {
    async fn fetch_tables(&self, source: &str) -> Result<Vec<RawTable>, ExtractionError> {
        Ok(self.load(source).await?.tables)
    }
}

#[async_trait]
impl CurrencyProvider for JsonTableProvider {
    async fn fetch_currencies(
        &self,
        source: &str,
        _tables: &[RawTable],
    ) -> Result<Option<PageCurrencies>, ExtractionError> {
        Ok(self.load(source).await?.currencies)
    }
}

/// Currencies given on the command line; they win over detected ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrencyOverride {
    pub data_currency: Option<Currency>,
    pub sales_currency: Option<Currency>,
}

impl CurrencyOverride {
    pub fn is_empty(&self) -> bool {
        self.data_currency.is_none() && self.sales_currency.is_none()
    }

    pub fn apply(&self, detected: Option<PageCurrencies>) -> Option<PageCurrencies> {
        if self.is_empty() {
            return detected;
        }
        let detected = detected.unwrap_or_default();
        Some(PageCurrencies {
            data_currency: self.data_currency.clone().or(detected.data_currency),
            sales_currency: self.sales_currency.clone().or(detected.sales_currency),
        })
    }
}
