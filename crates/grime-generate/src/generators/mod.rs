//! Record generators and the per-dataset generation context.
//!
//! A [`GenerationContext`] owns the dataset's [`RandomStream`] and the fired
//! defect tallies; generators borrow it mutably for the whole call, so every
//! draw of a dataset happens in one published, sequential order.

pub mod domain;

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use grime_core::DatasetKind;

use crate::errors::GenerationError;
use crate::faker_rs::Faker;
use crate::stream::RandomStream;

pub use domain::crm::CrmUserGenerator;
pub use domain::sales::SalesTransactionGenerator;
pub use domain::web::WebEventGenerator;

/// Mutable state of one dataset generation call.
pub struct GenerationContext<'a> {
    pub dataset: DatasetKind,
    pub stream: RandomStream,
    pub faker: &'a dyn Faker,
    /// Reference "today". Its midnight is "now" for timestamp windows.
    pub as_of: NaiveDate,
    defects: BTreeMap<&'static str, u64>,
}

impl<'a> GenerationContext<'a> {
    /// Context on the dataset's own sub-stream of the run seed.
    pub fn new(dataset: DatasetKind, seed: u64, faker: &'a dyn Faker, as_of: NaiveDate) -> Self {
        Self::with_stream(dataset, RandomStream::derived(seed, dataset.key()), faker, as_of)
    }

    pub fn with_stream(
        dataset: DatasetKind,
        stream: RandomStream,
        faker: &'a dyn Faker,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            dataset,
            stream,
            faker,
            as_of,
            defects: BTreeMap::new(),
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.as_of.and_time(NaiveTime::MIN)
    }

    /// `as_of` minus `days`, clamped to the calendar's range.
    pub fn days_before(&self, days: i64) -> NaiveDate {
        Duration::try_days(days)
            .and_then(|delta| self.as_of.checked_sub_signed(delta))
            .unwrap_or(NaiveDate::MIN)
    }

    /// `as_of` plus `days`, clamped to the calendar's range.
    pub fn days_after(&self, days: i64) -> NaiveDate {
        Duration::try_days(days)
            .and_then(|delta| self.as_of.checked_add_signed(delta))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn uuid(&mut self) -> String {
        self.faker.uuid(&mut self.stream)
    }

    pub fn record_defect(&mut self, policy: &'static str) {
        *self.defects.entry(policy).or_insert(0) += 1;
    }

    /// Fired count per policy name. Policies that never fired are absent.
    pub fn defects(&self) -> &BTreeMap<&'static str, u64> {
        &self.defects
    }

    pub fn into_defects(self) -> BTreeMap<&'static str, u64> {
        self.defects
    }
}

/// Output of one generator call: the records plus the pool sizes it built.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedBatch<R> {
    pub records: Vec<R>,
    pub pools: BTreeMap<&'static str, usize>,
}

/// One of the three dataset generators.
///
/// Implementations validate their rates in their constructor and reject a
/// zero row count before the first draw.
pub trait RecordGenerator {
    type Record: Serialize;

    fn dataset(&self) -> DatasetKind;

    fn generate(
        &self,
        ctx: &mut GenerationContext<'_>,
        rows: usize,
    ) -> Result<GeneratedBatch<Self::Record>, GenerationError>;
}

pub(crate) fn ensure_rows(dataset: DatasetKind, rows: usize) -> Result<(), GenerationError> {
    if rows == 0 {
        return Err(GenerationError::config(format!(
            "{dataset} needs a positive record count"
        )));
    }
    Ok(())
}

/// Round half away from zero to four decimals.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
