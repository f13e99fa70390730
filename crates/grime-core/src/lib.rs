//! Core contracts and helpers for Grime.
//!
//! This crate defines the dataset contracts (kinds, record entities, field
//! order), the static reference data the generators draw from, and utilities
//! shared by the engine, the profiler and the warehouse collaborators.

pub mod dataset;
pub mod error;
pub mod phone;
pub mod records;
pub mod redaction;
pub mod reference;

pub use dataset::{DatasetFormat, DatasetKind};
pub use error::{Error, Result};
pub use phone::PhoneFormat;
pub use records::{
    CrmUser, DeviceType, EventTimestamp, EventType, PlanTier, Region, SalesTransaction, WebEvent,
};
pub use redaction::{RedactedConnection, redact_connection_string};
pub use reference::{PRODUCTS, Product, US_STATES, UsState, product_by_id, state_code, state_name};

/// Current contract version for generated dataset artifacts.
pub const DATASET_VERSION: &str = "0.1";
