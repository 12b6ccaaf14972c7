//! Shared types for the stock fundamentals pipeline: canonical metric keys,
//! normalized cell values, scraped tables, match tables and record sets.

pub mod error;
pub mod normalize;
pub mod record;
pub mod synonyms;
pub mod traits;
pub mod types;
pub mod value;

pub use error::*;
pub use record::*;
pub use synonyms::SynonymMap;
pub use traits::*;
pub use types::*;
pub use value::CellValue;
