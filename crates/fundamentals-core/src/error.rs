use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Invalid match table: {0}")]
    InvalidMatchTable(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid synonym configuration: {0}")]
    InvalidSynonyms(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
