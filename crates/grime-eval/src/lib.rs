//! Defect profiling for generated datasets.
//!
//! Re-measures every declared defect rate and structural invariant of a
//! dataset directory and renders `profile.json` plus a markdown report.

pub mod engine;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod report;

pub use engine::{METRICS_FILE, ProfileEngine, REPORT_MD_FILE};
pub use errors::EvalError;
pub use metrics::{DatasetMetrics, METRICS_VERSION, ProfileReport, RateCheck};
pub use model::{ProfileOptions, ProfileResult, Violation};
pub use report::render_report;
