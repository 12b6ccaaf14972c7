//! Stock Store
//!
//! Persistence for extracted fundamentals: sparse per-year items, a SQLite
//! store with import bookkeeping, and the `;`-separated year report.

pub mod db;
pub mod error;
pub mod items;
pub mod report;

pub use db::{StockDb, StockMeta};
pub use error::StoreError;
pub use items::{to_items, StoredItem, StoredValue};
pub use report::{render_report, ReportWindow, REPORT_FIELDS};
