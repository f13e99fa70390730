//! Dataset serialization. Every dataset is encoded to bytes in memory and
//! only then written, atomically, to its file.

pub mod atomic;
pub mod csv;
pub mod json;
pub mod parquet;

use std::path::Path;

use grime_core::{CrmUser, DatasetFormat, DatasetKind, SalesTransaction, WebEvent};

use crate::errors::GenerationError;

/// A fully generated dataset held in memory.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    Events(Vec<WebEvent>),
    Users(Vec<CrmUser>),
    Transactions(Vec<SalesTransaction>),
}

impl Dataset {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Dataset::Events(_) => DatasetKind::Events,
            Dataset::Users(_) => DatasetKind::Users,
            Dataset::Transactions(_) => DatasetKind::Transactions,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Dataset::Events(rows) => rows.len(),
            Dataset::Users(rows) => rows.len(),
            Dataset::Transactions(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encode in the dataset's published format.
    pub fn encode(&self) -> Result<Vec<u8>, GenerationError> {
        match self {
            Dataset::Events(rows) => json::encode_records(rows),
            Dataset::Users(rows) => csv::encode_records(rows),
            Dataset::Transactions(rows) => parquet::encode_transactions(rows),
        }
    }

    pub fn decode(kind: DatasetKind, data: &[u8]) -> Result<Dataset, GenerationError> {
        match kind.format() {
            DatasetFormat::Json => Ok(Dataset::Events(json::decode_records(data)?)),
            DatasetFormat::Csv => Ok(Dataset::Users(csv::decode_records(data)?)),
            DatasetFormat::Parquet => {
                Ok(Dataset::Transactions(parquet::decode_transactions(data)?))
            }
        }
    }

    /// Read `<dir>/<file_name>` for `kind`.
    pub fn read(kind: DatasetKind, dir: &Path) -> Result<Dataset, GenerationError> {
        let data = std::fs::read(dir.join(kind.file_name()))?;
        Dataset::decode(kind, &data)
    }
}

/// Field names present in an encoded file. JSON keys come back sorted.
pub fn field_names(kind: DatasetKind, data: &[u8]) -> Result<Vec<String>, GenerationError> {
    match kind.format() {
        DatasetFormat::Json => {
            let rows: Vec<serde_json::Map<String, serde_json::Value>> =
                json::decode_records(data)?;
            let first = rows.first().ok_or_else(|| GenerationError::Malformed {
                dataset: kind,
                message: "empty record array".to_string(),
            })?;
            Ok(first.keys().cloned().collect())
        }
        DatasetFormat::Csv => csv::header(data),
        DatasetFormat::Parquet => parquet::column_names(data),
    }
}
