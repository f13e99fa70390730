use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use grime_core::{DatasetFormat, DatasetKind};

use crate::errors::GenerationError;
use crate::rates::DefectRates;

pub const DEFAULT_SEED: u64 = 42;

/// Options for the generation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Directory the dataset files and the report are written to.
    pub out_dir: PathBuf,
    pub seed: u64,
    /// Reference "today" for every date window.
    pub as_of: NaiveDate,
    /// Row count overrides. Datasets not listed use their published count.
    #[serde(default)]
    pub rows: BTreeMap<DatasetKind, usize>,
    /// Datasets to emit, in order.
    pub datasets: Vec<DatasetKind>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("data/raw"),
            seed: DEFAULT_SEED,
            as_of: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            rows: BTreeMap::new(),
            datasets: DatasetKind::ALL.to_vec(),
        }
    }
}

impl GenerateOptions {
    pub fn rows_for(&self, dataset: DatasetKind) -> usize {
        self.rows
            .get(&dataset)
            .copied()
            .unwrap_or_else(|| dataset.default_rows())
    }

    pub fn with_rows(mut self, dataset: DatasetKind, rows: usize) -> Self {
        self.rows.insert(dataset, rows);
        self
    }
}

/// Summary of one written dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetReport {
    pub dataset: DatasetKind,
    pub file_name: String,
    pub format: DatasetFormat,
    /// Seed of the dataset's own sub-stream.
    pub stream_seed: u64,
    pub rows_requested: u64,
    pub rows_generated: u64,
    /// Unique values per key pool.
    pub pools: BTreeMap<String, u64>,
    /// Fired count per corruption policy.
    pub defects: BTreeMap<String, u64>,
    pub bytes_written: u64,
    pub sha256: String,
    pub duration_ms: u64,
}

impl DatasetReport {
    pub fn defect_count(&self, policy: &str) -> u64 {
        self.defects.get(policy).copied().unwrap_or(0)
    }
}

/// Report for a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub version: String,
    pub seed: u64,
    pub as_of: NaiveDate,
    pub rates: DefectRates,
    pub datasets: Vec<DatasetReport>,
    pub bytes_written: u64,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(run_id: String, seed: u64, as_of: NaiveDate, rates: DefectRates) -> Self {
        Self {
            run_id,
            version: grime_core::DATASET_VERSION.to_string(),
            seed,
            as_of,
            rates,
            datasets: Vec::new(),
            bytes_written: 0,
            duration_ms: 0,
        }
    }

    pub fn dataset(&self, dataset: DatasetKind) -> Option<&DatasetReport> {
        self.datasets.iter().find(|report| report.dataset == dataset)
    }

    pub fn load(path: &Path) -> Result<Self, GenerationError> {
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }
}
