use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use grime_core::DatasetKind;

use crate::model::Violation;

/// Metrics contract version for profiles.
pub const METRICS_VERSION: &str = "0.1";

/// Machine-readable profile of a generated dataset directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileReport {
    pub metrics_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub as_of: NaiveDate,
    pub datasets: Vec<DatasetMetrics>,
    pub rate_checks: Vec<RateCheck>,
    pub violations: Vec<Violation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub performance: PerformanceMetrics,
}

impl ProfileReport {
    pub fn failed_checks(&self) -> impl Iterator<Item = &RateCheck> {
        self.rate_checks.iter().filter(|check| !check.within_tolerance)
    }

    pub fn rate(&self, dataset: DatasetKind, metric: &str) -> Option<&RateCheck> {
        self.rate_checks
            .iter()
            .find(|check| check.dataset == dataset && check.metric == metric)
    }
}

/// Per-dataset row counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetrics {
    pub dataset: DatasetKind,
    pub file_name: String,
    pub rows_found: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_expected: Option<u64>,
}

/// A measured defect share against its declared target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateCheck {
    pub dataset: DatasetKind,
    pub metric: String,
    pub target: f64,
    pub measured: f64,
    pub count: u64,
    pub tolerance: f64,
    pub within_tolerance: bool,
    /// Fired count recorded at generation time, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<u64>,
}

/// Timings for the profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub load_ms: u128,
    pub profile_ms: u128,
    pub total_ms: u128,
}
