use thiserror::Error;

/// Core error type shared across Grime crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A dataset name or format could not be resolved.
    #[error("unknown dataset: {0}")]
    UnknownDataset(String),
    /// A value violates a dataset contract.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Convenience alias for results returned by Grime crates.
pub type Result<T> = std::result::Result<T, Error>;
