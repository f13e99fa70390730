use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Instant;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use grime_core::DatasetKind;

use crate::errors::GenerationError;
use crate::faker_rs::{FakeRsFaker, Faker};
use crate::generators::{
    CrmUserGenerator, GeneratedBatch, GenerationContext, RecordGenerator,
    SalesTransactionGenerator, WebEventGenerator,
};
use crate::model::{DatasetReport, GenerateOptions, GenerationReport};
use crate::output::Dataset;
use crate::output::atomic::{write_bytes_atomic, write_json_atomic};
use crate::rates::DefectRates;

pub const REPORT_FILE: &str = "generation_report.json";

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub out_dir: PathBuf,
    pub report_path: PathBuf,
    pub report: GenerationReport,
}

/// One dataset generated in memory, with its ground truth.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDataset {
    pub dataset: Dataset,
    pub stream_seed: u64,
    pub pools: BTreeMap<&'static str, usize>,
    pub defects: BTreeMap<&'static str, u64>,
}

/// Entry point for generating the three dirty datasets.
///
/// Construction validates options and rates; nothing is drawn or written
/// until [`GenerationEngine::run`].
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
    rates: DefectRates,
    events: WebEventGenerator,
    users: CrmUserGenerator,
    transactions: SalesTransactionGenerator,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions, rates: DefectRates) -> Result<Self, GenerationError> {
        rates.validate()?;
        if options.datasets.is_empty() {
            return Err(GenerationError::config("no datasets selected"));
        }
        let unique: BTreeSet<DatasetKind> = options.datasets.iter().copied().collect();
        if unique.len() != options.datasets.len() {
            return Err(GenerationError::config("dataset selected more than once"));
        }
        for dataset in &options.datasets {
            if options.rows_for(*dataset) == 0 {
                return Err(GenerationError::config(format!(
                    "{dataset} needs a positive record count"
                )));
            }
        }

        Ok(Self {
            events: WebEventGenerator::new(rates.events.clone())?,
            users: CrmUserGenerator::new(rates.users.clone())?,
            transactions: SalesTransactionGenerator::new(rates.transactions.clone())?,
            options,
            rates,
        })
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn rates(&self) -> &DefectRates {
        &self.rates
    }

    /// Generate and write every selected dataset with the `fake`-backed faker.
    pub fn run(&self) -> Result<GenerationResult, GenerationError> {
        self.run_with_faker(&FakeRsFaker::new())
    }

    pub fn run_with_faker(&self, faker: &dyn Faker) -> Result<GenerationResult, GenerationError> {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let out_dir = self.options.out_dir.clone();
        std::fs::create_dir_all(&out_dir)?;

        let mut report = GenerationReport::new(
            run_id.clone(),
            self.options.seed,
            self.options.as_of,
            self.rates.clone(),
        );

        info!(
            run_id = %run_id,
            seed = self.options.seed,
            as_of = %self.options.as_of,
            datasets = self.options.datasets.len(),
            out_dir = %out_dir.display(),
            "generation started"
        );

        for dataset in &self.options.datasets {
            let dataset_start = Instant::now();
            let rows_requested = self.options.rows_for(*dataset);
            info!(dataset = %dataset, rows = rows_requested, "generating dataset");

            let generated = self.generate(*dataset, faker).inspect_err(|err| {
                warn!(dataset = %dataset, error = %err, "generation failed");
            })?;
            let data = generated.dataset.encode()?;
            let path = out_dir.join(dataset.file_name());
            let bytes_written = write_bytes_atomic(&path, &data)?;
            let sha256 = hex::encode(Sha256::digest(&data));

            let dataset_report = DatasetReport {
                dataset: *dataset,
                file_name: dataset.file_name().to_string(),
                format: dataset.format(),
                stream_seed: generated.stream_seed,
                rows_requested: rows_requested as u64,
                rows_generated: generated.dataset.len() as u64,
                pools: generated
                    .pools
                    .iter()
                    .map(|(name, size)| (name.to_string(), *size as u64))
                    .collect(),
                defects: generated
                    .defects
                    .iter()
                    .map(|(name, count)| (name.to_string(), *count))
                    .collect(),
                bytes_written,
                sha256,
                duration_ms: dataset_start.elapsed().as_millis() as u64,
            };

            info!(
                dataset = %dataset,
                rows_generated = dataset_report.rows_generated,
                bytes_written,
                sha256 = %dataset_report.sha256,
                duration_ms = dataset_report.duration_ms,
                "dataset written"
            );
            report.bytes_written += bytes_written;
            report.datasets.push(dataset_report);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        let report_path = out_dir.join(REPORT_FILE);
        write_json_atomic(&report_path, &report)?;

        info!(
            run_id = %run_id,
            datasets = report.datasets.len(),
            bytes_written = report.bytes_written,
            duration_ms = report.duration_ms,
            "generation completed"
        );

        Ok(GenerationResult {
            out_dir,
            report_path,
            report,
        })
    }

    /// Generate one dataset in memory on its own sub-stream. Output does not
    /// depend on which other datasets are selected.
    pub fn generate(
        &self,
        dataset: DatasetKind,
        faker: &dyn Faker,
    ) -> Result<GeneratedDataset, GenerationError> {
        let rows = self.options.rows_for(dataset);
        let mut ctx = GenerationContext::new(dataset, self.options.seed, faker, self.options.as_of);
        let stream_seed = ctx.stream.seed();

        let (dataset, pools) = match dataset {
            DatasetKind::Events => {
                let GeneratedBatch { records, pools } = self.events.generate(&mut ctx, rows)?;
                (Dataset::Events(records), pools)
            }
            DatasetKind::Users => {
                let GeneratedBatch { records, pools } = self.users.generate(&mut ctx, rows)?;
                (Dataset::Users(records), pools)
            }
            DatasetKind::Transactions => {
                let GeneratedBatch { records, pools } =
                    self.transactions.generate(&mut ctx, rows)?;
                (Dataset::Transactions(records), pools)
            }
        };

        Ok(GeneratedDataset {
            dataset,
            stream_seed,
            pools,
            defects: ctx.into_defects(),
        })
    }
}
