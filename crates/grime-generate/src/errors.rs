use thiserror::Error;

use grime_core::DatasetKind;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Invalid defect-rate, pool-size or row-count parameters. Always raised
    /// before the first draw of the affected dataset.
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("pool '{pool}' exhausted: {produced} of {requested} distinct values after {attempts} attempts")]
    PoolExhausted {
        pool: &'static str,
        requested: usize,
        produced: usize,
        attempts: usize,
    },
    #[error("dataset {dataset} is malformed: {message}")]
    Malformed {
        dataset: DatasetKind,
        message: String,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("rates file error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl GenerationError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        GenerationError::Configuration(message.into())
    }
}
