use std::path::Path;
use std::time::Instant;

use chrono::{Duration, NaiveDate, NaiveTime};

use grime_core::{
    CrmUser, DatasetKind, PhoneFormat, SalesTransaction, WebEvent, product_by_id, state_code,
};
use grime_generate::generators::domain::{crm, sales, web};
use grime_generate::generators::round4;
use grime_generate::output::atomic::{write_bytes_atomic, write_json_atomic};
use grime_generate::{
    Dataset, DefectRates, EventRates, GenerationReport, REPORT_FILE, TransactionRates, UserRates,
};

use crate::errors::EvalError;
use crate::metrics::{
    DatasetMetrics, METRICS_VERSION, PerformanceMetrics, ProfileReport, RateCheck,
};
use crate::model::{ProfileOptions, ProfileResult, Violation};
use crate::report::render_report;

pub const METRICS_FILE: &str = "profile.json";
pub const REPORT_MD_FILE: &str = "profile.md";

/// Re-measures declared defect rates and structural invariants of a
/// generated dataset directory.
#[derive(Debug, Clone)]
pub struct ProfileEngine {
    options: ProfileOptions,
}

impl ProfileEngine {
    pub fn new(options: ProfileOptions) -> Self {
        Self { options }
    }

    pub fn run(&self, dataset_dir: &Path) -> Result<ProfileResult, EvalError> {
        let total_start = Instant::now();
        let load_start = Instant::now();

        let generation = load_generation_report(dataset_dir)?;
        let as_of = generation
            .as_ref()
            .map(|report| report.as_of)
            .or(self.options.as_of)
            .ok_or_else(|| {
                EvalError::InvalidDataset(format!(
                    "{} has no {REPORT_FILE}; pass an explicit as_of date",
                    dataset_dir.display()
                ))
            })?;
        let rates = generation
            .as_ref()
            .map(|report| report.rates.clone())
            .unwrap_or_default();
        rates.validate()?;

        let kinds: Vec<DatasetKind> = match &generation {
            Some(report) => report.datasets.iter().map(|entry| entry.dataset).collect(),
            None => DatasetKind::ALL.to_vec(),
        };

        let mut warnings = Vec::new();
        let mut datasets = Vec::new();
        for kind in kinds {
            let path = dataset_dir.join(kind.file_name());
            if !path.exists() {
                warnings.push(format!("{kind}: {} not found", kind.file_name()));
                continue;
            }
            datasets.push(Dataset::read(kind, dataset_dir)?);
        }
        if datasets.is_empty() {
            return Err(EvalError::InvalidDataset(format!(
                "no dataset files found in {}",
                dataset_dir.display()
            )));
        }
        let load_ms = load_start.elapsed().as_millis();

        let profile_start = Instant::now();
        let mut profiler = Profiler::new(&self.options, &rates, as_of, generation.as_ref());
        let mut dataset_metrics = Vec::new();
        for dataset in &datasets {
            profiler.profile(dataset);
            let kind = dataset.kind();
            dataset_metrics.push(DatasetMetrics {
                dataset: kind,
                file_name: kind.file_name().to_string(),
                rows_found: dataset.len() as u64,
                rows_expected: generation
                    .as_ref()
                    .and_then(|report| report.dataset(kind))
                    .map(|entry| entry.rows_generated),
            });
        }
        for entry in &dataset_metrics {
            if let Some(expected) = entry.rows_expected {
                if expected != entry.rows_found {
                    profiler.violation(
                        entry.dataset,
                        "row_count_mismatch",
                        format!("expected {expected} rows, found {}", entry.rows_found),
                        None,
                        None,
                    );
                }
            }
        }
        let (rate_checks, violations) = profiler.finish();
        let profile_ms = profile_start.elapsed().as_millis();

        let metrics = ProfileReport {
            metrics_version: METRICS_VERSION.to_string(),
            run_id: generation.as_ref().map(|report| report.run_id.clone()),
            seed: generation.as_ref().map(|report| report.seed),
            as_of,
            datasets: dataset_metrics,
            rate_checks,
            violations,
            warnings,
            performance: PerformanceMetrics {
                load_ms,
                profile_ms,
                total_ms: total_start.elapsed().as_millis(),
            },
        };

        let report = render_report(&metrics, self.options.max_examples);
        let out_dir = self
            .options
            .out_dir
            .clone()
            .unwrap_or_else(|| dataset_dir.to_path_buf());
        std::fs::create_dir_all(&out_dir)?;

        let metrics_path = out_dir.join(METRICS_FILE);
        write_json_atomic(&metrics_path, &metrics)?;
        let report_path = out_dir.join(REPORT_MD_FILE);
        write_bytes_atomic(&report_path, report.as_bytes())?;

        let findings = metrics.violations.len() + metrics.failed_checks().count();
        if self.options.strict && findings > 0 {
            return Err(EvalError::Violations(findings as u64));
        }

        Ok(ProfileResult {
            out_dir,
            metrics_path,
            report_path,
            metrics,
            report,
        })
    }

    /// Profile in-memory datasets without touching the filesystem.
    pub fn profile(
        &self,
        datasets: &[Dataset],
        rates: &DefectRates,
        as_of: NaiveDate,
    ) -> (Vec<RateCheck>, Vec<Violation>) {
        let mut profiler = Profiler::new(&self.options, rates, as_of, None);
        for dataset in datasets {
            profiler.profile(dataset);
        }
        profiler.finish()
    }
}

fn load_generation_report(dir: &Path) -> Result<Option<GenerationReport>, EvalError> {
    let path = dir.join(REPORT_FILE);
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(GenerationReport::load(&path)?))
}

struct Profiler<'a> {
    options: &'a ProfileOptions,
    rates: &'a DefectRates,
    as_of: NaiveDate,
    generation: Option<&'a GenerationReport>,
    checks: Vec<RateCheck>,
    violations: Vec<Violation>,
}

impl<'a> Profiler<'a> {
    fn new(
        options: &'a ProfileOptions,
        rates: &'a DefectRates,
        as_of: NaiveDate,
        generation: Option<&'a GenerationReport>,
    ) -> Self {
        Self {
            options,
            rates,
            as_of,
            generation,
            checks: Vec::new(),
            violations: Vec::new(),
        }
    }

    fn finish(mut self) -> (Vec<RateCheck>, Vec<Violation>) {
        self.violations.sort_by(|a, b| {
            (a.dataset.as_str(), a.code.as_str(), a.row_index)
                .cmp(&(b.dataset.as_str(), b.code.as_str(), b.row_index))
        });
        (self.checks, self.violations)
    }

    fn profile(&mut self, dataset: &Dataset) {
        let rates = self.rates;
        match dataset {
            Dataset::Events(rows) => self.events(rows, &rates.events),
            Dataset::Users(rows) => self.users(rows, &rates.users),
            Dataset::Transactions(rows) => self.transactions(rows, &rates.transactions),
        }
    }

    fn events(&mut self, rows: &[WebEvent], rates: &EventRates) {
        let kind = DatasetKind::Events;
        let total = rows.len();
        let end = self.as_of.and_time(NaiveTime::MIN);
        let start = days_before(self.as_of, rates.lookback_days).and_time(NaiveTime::MIN);

        let null_users = rows.iter().filter(|row| row.user_id.is_none()).count();
        let missing = rows.iter().filter(|row| row.referrer.is_none()).count();
        let epoch = rows.iter().filter(|row| row.timestamp.is_epoch()).count();
        let duplicates = total - distinct(rows.iter().map(|row| row.session_id.as_str()));

        self.check(kind, web::NULL_USER_ID, null_users, total, rates.null_user_id, true);
        self.check(kind, web::MISSING_REFERRER, missing, total, rates.missing_referrer, true);
        self.check(kind, web::EPOCH_TIMESTAMP, epoch, total, rates.epoch_timestamp, true);
        self.check(
            kind,
            "duplicate_session_id",
            duplicates,
            total,
            rates.session_dup_ratio,
            false,
        );

        for (idx, row) in rows.iter().enumerate() {
            match row.timestamp.to_datetime() {
                None => self.violation(
                    kind,
                    "unparseable_timestamp",
                    "timestamp is neither ISO-8601 nor epoch seconds".to_string(),
                    Some(idx),
                    Some(format!("{:?}", row.timestamp)),
                ),
                Some(moment) if moment < start || moment > end => self.violation(
                    kind,
                    "timestamp_out_of_window",
                    format!("timestamp outside [{start}, {end}]"),
                    Some(idx),
                    Some(moment.to_string()),
                ),
                Some(_) => {}
            }
        }
    }

    fn users(&mut self, rows: &[CrmUser], rates: &UserRates) {
        let kind = DatasetKind::Users;
        let total = rows.len();

        let full_names = rows.iter().filter(|row| row.state.len() != 2).count();
        let duplicates = total - distinct(rows.iter().map(|row| row.email.as_str()));
        self.check(kind, crm::FULL_STATE_NAME, full_names, total, rates.full_state_name, true);
        self.check(kind, "duplicate_email", duplicates, total, rates.email_dup_ratio, false);

        let mut formats = [0_usize; 4];
        for (idx, row) in rows.iter().enumerate() {
            if state_code(&row.state).is_none() {
                self.violation(
                    kind,
                    "unresolvable_state",
                    "state does not map to one of the 50 codes".to_string(),
                    Some(idx),
                    Some(row.state.clone()),
                );
            }
            match PhoneFormat::detect(&row.phone) {
                Some(format) => {
                    if let Some(slot) = PhoneFormat::ALL.iter().position(|item| *item == format) {
                        formats[slot] += 1;
                    }
                }
                None => self.violation(
                    kind,
                    "unknown_phone_format",
                    "phone matches none of the four formats".to_string(),
                    Some(idx),
                    Some(row.phone.clone()),
                ),
            }
            if row.signup_date > self.as_of {
                self.violation(
                    kind,
                    "signup_in_future",
                    format!("signup_date after {}", self.as_of),
                    Some(idx),
                    Some(row.signup_date.to_string()),
                );
            }
        }
        let share = 1.0 / PhoneFormat::ALL.len() as f64;
        for (format, count) in PhoneFormat::ALL.iter().zip(formats) {
            let metric = format!("phone_{}", format.as_str());
            self.check(kind, &metric, count, total, share, false);
        }
    }

    fn transactions(&mut self, rows: &[SalesTransaction], rates: &TransactionRates) {
        let kind = DatasetKind::Transactions;
        let total = rows.len();
        let future_limit = days_after(self.as_of, rates.future_window_days);
        let past_limit = days_before(self.as_of, rates.lookback_days);
        let band = (1.0 - rates.price_jitter - 1e-4)..=(1.0 + rates.price_jitter + 1e-4);

        let negative = rows.iter().filter(|row| row.total_amount < 0.0).count();
        let future = rows
            .iter()
            .filter(|row| row.transaction_date > self.as_of)
            .count();
        let duplicates = total - distinct(rows.iter().map(|row| row.transaction_id.as_str()));
        self.check(kind, sales::NEGATIVE_TOTAL, negative, total, rates.negative_total, true);
        self.check(kind, sales::FUTURE_DATE, future, total, rates.future_date, true);
        self.check(
            kind,
            "duplicate_transaction_id",
            duplicates,
            total,
            rates.id_dup_ratio,
            false,
        );

        for (idx, row) in rows.iter().enumerate() {
            let product = product_by_id(&row.product_id)
                .filter(|product| product.name == row.product_name)
                .filter(|product| product.category == row.category);
            match product {
                None => self.violation(
                    kind,
                    "unknown_product",
                    "product does not match the catalog".to_string(),
                    Some(idx),
                    Some(row.product_id.clone()),
                ),
                Some(product) => {
                    let ratio = row.unit_price / product.price;
                    if !band.contains(&ratio) {
                        self.violation(
                            kind,
                            "price_out_of_band",
                            format!("unit_price is {ratio:.4}x the catalog price"),
                            Some(idx),
                            Some(row.unit_price.to_string()),
                        );
                    }
                }
            }
            if !(1..=rates.max_quantity).contains(&row.quantity) {
                self.violation(
                    kind,
                    "quantity_out_of_range",
                    format!("quantity outside 1..={}", rates.max_quantity),
                    Some(idx),
                    Some(row.quantity.to_string()),
                );
            }
            let expected = round4(row.quantity as f64 * row.unit_price);
            if (row.total_amount.abs() - expected).abs() > 1e-6 {
                self.violation(
                    kind,
                    "arithmetic_mismatch",
                    format!("|total_amount| != round4(quantity * unit_price) = {expected}"),
                    Some(idx),
                    Some(row.total_amount.to_string()),
                );
            }
            if row.transaction_date > future_limit || row.transaction_date < past_limit {
                self.violation(
                    kind,
                    "date_out_of_window",
                    format!("transaction_date outside [{past_limit}, {future_limit}]"),
                    Some(idx),
                    Some(row.transaction_date.to_string()),
                );
            }
        }
    }

    /// `exact` marks metrics that equal a policy's fired count, which are
    /// then compared to the generation report's ground truth.
    fn check(
        &mut self,
        dataset: DatasetKind,
        metric: &str,
        count: usize,
        total: usize,
        target: f64,
        exact: bool,
    ) {
        if total == 0 {
            return;
        }
        let measured = count as f64 / total as f64;
        let sigma = (target * (1.0 - target) / total as f64).sqrt();
        let tolerance = self.options.tolerance_sigmas * sigma + self.options.min_tolerance;
        let ground_truth = if exact {
            self.generation
                .and_then(|report| report.dataset(dataset))
                .map(|entry| entry.defect_count(metric))
        } else {
            None
        };
        if let Some(truth) = ground_truth {
            if truth != count as u64 {
                self.violation(
                    dataset,
                    "ground_truth_mismatch",
                    format!("{metric}: measured {count}, generation recorded {truth}"),
                    None,
                    None,
                );
            }
        }
        self.checks.push(RateCheck {
            dataset,
            metric: metric.to_string(),
            target,
            measured,
            count: count as u64,
            tolerance,
            within_tolerance: (measured - target).abs() <= tolerance,
            ground_truth,
        });
    }

    fn violation(
        &mut self,
        dataset: DatasetKind,
        code: &str,
        message: String,
        row_index: Option<usize>,
        example: Option<String>,
    ) {
        self.violations.push(Violation {
            code: code.to_string(),
            dataset: dataset.key().to_string(),
            message,
            row_index: row_index.map(|idx| idx as u64),
            example,
        });
    }
}

fn distinct<'v>(values: impl Iterator<Item = &'v str>) -> usize {
    values.collect::<std::collections::HashSet<_>>().len()
}

fn days_before(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|delta| date.checked_sub_signed(delta))
        .unwrap_or(NaiveDate::MIN)
}

fn days_after(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(NaiveDate::MAX)
}
