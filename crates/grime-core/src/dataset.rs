use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The three datasets produced by a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Events,
    Users,
    Transactions,
}

/// Serialized representation of a dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetFormat {
    /// A single JSON array of objects.
    Json,
    /// Comma separated values with a header row.
    Csv,
    /// Columnar Parquet file.
    Parquet,
}

const EVENT_FIELDS: &[&str] = &[
    "user_id",
    "session_id",
    "event_type",
    "page_url",
    "referrer",
    "device_type",
    "timestamp",
    "country",
];

const USER_FIELDS: &[&str] = &[
    "user_id",
    "first_name",
    "last_name",
    "email",
    "phone",
    "state",
    "city",
    "signup_date",
    "plan_tier",
];

const TRANSACTION_FIELDS: &[&str] = &[
    "transaction_id",
    "user_id",
    "product_id",
    "product_name",
    "category",
    "quantity",
    "unit_price",
    "total_amount",
    "region",
    "transaction_date",
];

impl DatasetKind {
    /// All datasets in generation order.
    pub const ALL: [DatasetKind; 3] = [
        DatasetKind::Events,
        DatasetKind::Users,
        DatasetKind::Transactions,
    ];

    /// Stable key used for seed derivation and report entries.
    pub fn key(self) -> &'static str {
        match self {
            DatasetKind::Events => "events",
            DatasetKind::Users => "users",
            DatasetKind::Transactions => "transactions",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            DatasetKind::Events => "web_events.json",
            DatasetKind::Users => "crm_users.csv",
            DatasetKind::Transactions => "sales_transactions.parquet",
        }
    }

    pub fn format(self) -> DatasetFormat {
        match self {
            DatasetKind::Events => DatasetFormat::Json,
            DatasetKind::Users => DatasetFormat::Csv,
            DatasetKind::Transactions => DatasetFormat::Parquet,
        }
    }

    /// Row count of the published dataset contract.
    pub fn default_rows(self) -> usize {
        match self {
            DatasetKind::Events => 40_000,
            DatasetKind::Users => 30_000,
            DatasetKind::Transactions => 30_000,
        }
    }

    /// Field names in serialization order.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            DatasetKind::Events => EVENT_FIELDS,
            DatasetKind::Users => USER_FIELDS,
            DatasetKind::Transactions => TRANSACTION_FIELDS,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DatasetKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "events" | "web_events" => Ok(DatasetKind::Events),
            "users" | "crm_users" => Ok(DatasetKind::Users),
            "transactions" | "sales_transactions" => Ok(DatasetKind::Transactions),
            _ => Err(Error::UnknownDataset(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dataset_aliases() {
        assert_eq!("events".parse::<DatasetKind>().ok(), Some(DatasetKind::Events));
        assert_eq!("CRM_USERS".parse::<DatasetKind>().ok(), Some(DatasetKind::Users));
        assert!(matches!(
            "orders".parse::<DatasetKind>(),
            Err(Error::UnknownDataset(_))
        ));
    }

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = DatasetKind::ALL.iter().map(|kind| kind.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), DatasetKind::ALL.len());
    }
}
