use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::ProfileReport;

/// Options for dataset profiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileOptions {
    /// Fail when a rate is out of tolerance or an invariant is violated.
    pub strict: bool,
    /// Limit the number of violation examples in the markdown report.
    pub max_examples: usize,
    /// Binomial standard deviations allowed around each target rate.
    pub tolerance_sigmas: f64,
    /// Absolute slack added to every tolerance.
    pub min_tolerance: f64,
    /// Reference "today" when the directory has no generation report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
    /// Optional output directory override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_examples: 20,
            tolerance_sigmas: 5.0,
            min_tolerance: 0.002,
            as_of: None,
            out_dir: None,
        }
    }
}

/// Structured invariant violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub code: String,
    pub dataset: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Result of a profiling run.
#[derive(Debug, Clone)]
pub struct ProfileResult {
    pub out_dir: PathBuf,
    pub metrics_path: PathBuf,
    pub report_path: PathBuf,
    pub metrics: ProfileReport,
    pub report: String,
}
