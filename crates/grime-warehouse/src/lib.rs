//! Warehouse collaborators: connection factory, schema lifecycle and the
//! tracked-query credit ledger.

pub mod config;
pub mod credits;
pub mod errors;
pub mod executor;
pub mod recording;
pub mod schema;
pub mod warehouse;

pub use config::{DATABASE_URL_ENV, ProjectPaths, RAW_DATA_DIR, SCHEMA_DIR, WarehouseConfig};
pub use credits::{CREDITS_PER_SECOND, CreditEntry, CreditLedger, CreditReport, render_credit_table};
pub use errors::{Result, WarehouseError};
pub use executor::{PgExecutor, Row, SqlExecutor, SqlParam};
pub use recording::RecordingExecutor;
pub use schema::{MEDALLION_SCHEMAS, drop_statements, load_statements, schema_files, split_statements};
pub use warehouse::Warehouse;
