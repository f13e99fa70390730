//! Per-run artifact directory: `runs/<timestamp>__run_<id>/` with the
//! resolved options, JSON logs and a command summary.

mod logging;
mod run;

pub use logging::init_run_logging;
pub use run::{RunContext, RunPaths, start_run, write_summary};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("cannot write run artifacts: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot encode run artifact: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot install run logger: {0}")]
    Logging(String),
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
