use thiserror::Error;

use grime_generate::GenerationError;

/// Errors emitted by the defect profiler.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
    #[error("profile failed with {0} finding(s)")]
    Violations(u64),
    #[error("dataset error: {0}")]
    Generation(#[from] GenerationError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
