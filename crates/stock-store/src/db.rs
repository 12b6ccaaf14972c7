use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::Utc;
use fundamentals_core::{CellValue, MetricKey, RecordSet};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::items::{to_items, StoredItem};
use crate::StoreError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS stock_data (
    isin TEXT NOT NULL,
    year INTEGER NOT NULL,
    metric TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (isin, year, metric)
);
CREATE TABLE IF NOT EXISTS stock_meta (
    isin TEXT PRIMARY KEY,
    last_import REAL NOT NULL DEFAULT 0,
    estimation_url TEXT,
    income_statement_url TEXT
);
";

/// Import bookkeeping for one stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StockMeta {
    pub isin: String,
    /// Unix timestamp (seconds) of the last import, 0 if never imported.
    pub last_import: f64,
    pub estimation_url: Option<String>,
    pub income_statement_url: Option<String>,
}

/// SQLite store for per-year stock fundamentals.
#[derive(Clone)]
pub struct StockDb {
    pool: SqlitePool,
}

impl StockDb {
    /// Connects and creates the tables if needed.
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // every connection to an in-memory database sees its own database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA.split(';') {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(&self.pool).await?;
            }
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Upserts every attribute of one year. An empty item writes nothing.
    pub async fn upsert_item(&self, isin: &str, item: &StoredItem) -> Result<(), StoreError> {
        if item.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for (metric, value) in &item.attributes {
            sqlx::query(
                "INSERT INTO stock_data (isin, year, metric, value) VALUES (?, ?, ?, ?)
                 ON CONFLICT(isin, year, metric) DO UPDATE SET value = excluded.value",
            )
            .bind(isin)
            .bind(item.year)
            .bind(metric)
            .bind(value.to_db_string())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::debug!("Wrote {} attributes for {} {}", item.attributes.len(), isin, item.year);
        Ok(())
    }

    /// Persists a record set as sparse items. Returns the number of
    /// non-empty years written.
    pub async fn persist_record_set(
        &self,
        isin: &str,
        records: &RecordSet,
    ) -> Result<usize, StoreError> {
        let mut written = 0;
        for item in to_items(records).iter().filter(|i| !i.is_empty()) {
            self.upsert_item(isin, item).await?;
            written += 1;
        }
        tracing::info!("Persisted {} years for {}", written, isin);
        Ok(written)
    }

    /// Loads everything stored for a stock, `None` if nothing is stored.
    pub async fn fetch_record_set(&self, isin: &str) -> Result<Option<RecordSet>, StoreError> {
        let rows: Vec<(i64, String, String)> = sqlx::query_as(
            "SELECT year, metric, value FROM stock_data WHERE isin = ? ORDER BY year",
        )
        .bind(isin)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut cells = Vec::with_capacity(rows.len());
        let mut metrics = BTreeSet::new();
        for (year, metric, value) in rows {
            let metric = match metric.parse::<MetricKey>() {
                Ok(metric) => metric,
                Err(e) => {
                    tracing::warn!("Ignoring stored attribute for {}: {}", isin, e);
                    continue;
                }
            };
            metrics.insert(metric);
            cells.push((year as i32, metric, CellValue::parse(&value)));
        }

        let mut records = RecordSet::new();
        for metric in metrics {
            records.add_column(metric);
        }
        for (year, metric, value) in cells {
            records.add_year(year);
            records.set(year, metric, value);
        }
        Ok(Some(records))
    }

    /// Registers a stock for import; existing entries are left untouched.
    pub async fn add_stock_meta(&self, isin: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT OR IGNORE INTO stock_meta (isin, last_import) VALUES (?, 0)")
            .bind(isin)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn fetch_stock_meta(&self, isin: &str) -> Result<Option<StockMeta>, StoreError> {
        let meta = sqlx::query_as::<_, StockMeta>(
            "SELECT isin, last_import, estimation_url, income_statement_url
             FROM stock_meta WHERE isin = ?",
        )
        .bind(isin)
        .fetch_optional(&self.pool)
        .await?;
        Ok(meta)
    }

    /// Stores source page URLs; `None` keeps the current value.
    pub async fn update_source_urls(
        &self,
        isin: &str,
        estimation_url: Option<&str>,
        income_statement_url: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE stock_meta
             SET estimation_url = COALESCE(?, estimation_url),
                 income_statement_url = COALESCE(?, income_statement_url)
             WHERE isin = ?",
        )
        .bind(estimation_url)
        .bind(income_statement_url)
        .bind(isin)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_last_import(&self, isin: &str) -> Result<(), StoreError> {
        let now = Utc::now().timestamp_millis() as f64 / 1000.0;
        sqlx::query("UPDATE stock_meta SET last_import = ? WHERE isin = ?")
            .bind(now)
            .bind(isin)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// The stock imported longest ago (never imported first).
    pub async fn fetch_oldest_stock_meta(&self) -> Result<Option<String>, StoreError> {
        let isin: Option<(String,)> = sqlx::query_as(
            "SELECT isin FROM stock_meta ORDER BY last_import ASC, isin ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(isin.map(|(isin,)| isin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundamentals_core::Currency;

    async fn memory_db() -> StockDb {
        StockDb::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_db_creation() {
        let db = memory_db().await;
        assert!(db.pool().acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_persist_and_fetch_record_set() {
        let db = memory_db().await;
        let eur = Currency::new("EUR").unwrap();

        let mut records = RecordSet::new();
        records.set(2021, MetricKey::Kgv, CellValue::Number(12.5));
        records.set(2021, MetricKey::Sales, CellValue::money(1_000_000.0, eur.clone()));
        records.set(2022, MetricKey::DividendYield, CellValue::Percent(1.28));
        records.set(2023, MetricKey::Ebit, CellValue::Empty);

        let written = db.persist_record_set("DE0007164600", &records).await.unwrap();
        assert_eq!(written, 2);

        let loaded = db.fetch_record_set("DE0007164600").await.unwrap().unwrap();
        assert_eq!(loaded.years(), vec![2021, 2022]);
        assert_eq!(
            loaded.columns(),
            &[MetricKey::Sales, MetricKey::DividendYield, MetricKey::Kgv]
        );
        assert_eq!(loaded.get(2021, MetricKey::Kgv), &CellValue::Number(12.5));
        assert_eq!(loaded.get(2021, MetricKey::Sales), &CellValue::money(1_000_000.0, eur));
        assert_eq!(loaded.get(2022, MetricKey::DividendYield), &CellValue::Percent(1.28));

        assert!(db.fetch_record_set("US0378331005").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites_attribute() {
        let db = memory_db().await;

        let mut records = RecordSet::new();
        records.set(2022, MetricKey::Kgv, CellValue::Number(10.0));
        db.persist_record_set("X", &records).await.unwrap();
        records.set(2022, MetricKey::Kgv, CellValue::Number(11.0));
        db.persist_record_set("X", &records).await.unwrap();

        let loaded = db.fetch_record_set("X").await.unwrap().unwrap();
        assert_eq!(loaded.get(2022, MetricKey::Kgv), &CellValue::Number(11.0));
    }

    #[tokio::test]
    async fn test_stock_meta_bookkeeping() {
        let db = memory_db().await;
        assert!(db.fetch_oldest_stock_meta().await.unwrap().is_none());

        db.add_stock_meta("B").await.unwrap();
        db.add_stock_meta("A").await.unwrap();
        db.add_stock_meta("A").await.unwrap();

        assert_eq!(db.fetch_oldest_stock_meta().await.unwrap().as_deref(), Some("A"));

        db.update_last_import("A").await.unwrap();
        assert_eq!(db.fetch_oldest_stock_meta().await.unwrap().as_deref(), Some("B"));

        db.update_source_urls("B", Some("https://example.com/est"), None).await.unwrap();
        db.update_source_urls("B", None, Some("https://example.com/guv")).await.unwrap();
        let meta = db.fetch_stock_meta("B").await.unwrap().unwrap();
        assert_eq!(meta.estimation_url.as_deref(), Some("https://example.com/est"));
        assert_eq!(meta.income_statement_url.as_deref(), Some("https://example.com/guv"));
        assert_eq!(meta.last_import, 0.0);

        let a = db.fetch_stock_meta("A").await.unwrap().unwrap();
        assert!(a.last_import > 0.0);
        assert!(db.fetch_stock_meta("C").await.unwrap().is_none());
    }
}
