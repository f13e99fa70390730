//! Calibrated dirty-data generation engine.
//!
//! Produces the web events, CRM users and sales transactions datasets with
//! declared defect rates, reproducibly under a fixed seed.

pub mod engine;
pub mod errors;
pub mod faker_rs;
pub mod generators;
pub mod model;
pub mod output;
pub mod policy;
pub mod pool;
pub mod rates;
pub mod stream;

pub use engine::{GeneratedDataset, GenerationEngine, GenerationResult, REPORT_FILE};
pub use errors::GenerationError;
pub use faker_rs::{FakeRsFaker, Faker, ScriptedFaker};
pub use generators::{
    CrmUserGenerator, GeneratedBatch, GenerationContext, RecordGenerator,
    SalesTransactionGenerator, WebEventGenerator,
};
pub use model::{DatasetReport, GenerateOptions, GenerationReport};
pub use output::Dataset;
pub use policy::CorruptionPolicy;
pub use pool::{Pool, PoolCursor, PoolSpec};
pub use rates::{DefectRates, EventRates, TransactionRates, UserRates};
pub use stream::{RandomStream, derive_seed};
