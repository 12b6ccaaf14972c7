use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use fundamentals_core::SynonymMap;
use std::env;
use std::path::PathBuf;
use stock_store::ReportWindow;

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub database_url: String,
    /// JSON synonym map replacing the built-in one.
    pub synonyms_path: Option<PathBuf>,
    pub report_years_back: i32,
    pub report_years_ahead: i32,
}

impl LoaderConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:stocks.db".to_string()),
            synonyms_path: env::var("SYNONYMS_PATH").ok().map(PathBuf::from),
            report_years_back: env::var("REPORT_YEARS_BACK")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("REPORT_YEARS_BACK must be an integer")?,
            report_years_ahead: env::var("REPORT_YEARS_AHEAD")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .context("REPORT_YEARS_AHEAD must be an integer")?,
        })
    }

    pub fn synonyms(&self) -> Result<SynonymMap> {
        match &self.synonyms_path {
            Some(path) => {
                let synonyms = SynonymMap::from_path(path)
                    .with_context(|| format!("Failed to load synonyms from {}", path.display()))?;
                tracing::info!("Loaded {} synonym entries from {}", synonyms.len(), path.display());
                Ok(synonyms)
            }
            None => Ok(SynonymMap::builtin().clone()),
        }
    }

    pub fn report_window(&self) -> ReportWindow {
        ReportWindow::around(Utc::now().year(), self.report_years_back, self.report_years_ahead)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:stocks.db".to_string(),
            synonyms_path: None,
            report_years_back: 2,
            report_years_ahead: 4,
        }
    }
}
