//! Declared defect rates, one structure per generator.
//!
//! The `Default` of every structure is the published contract; tests assert
//! against the same constants the generators read. A TOML file may override
//! individual values, everything left out keeps its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DefectRates {
    pub events: EventRates,
    pub users: UserRates,
    pub transactions: TransactionRates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRates {
    /// Share of events with a null `user_id`.
    pub null_user_id: f64,
    /// Share of events whose `session_id` is drawn from the reuse bucket.
    pub session_reuse: f64,
    /// Session pool is this much smaller than the event count.
    pub session_dup_ratio: f64,
    pub session_bucket: usize,
    /// Share of events without a referrer.
    pub missing_referrer: f64,
    /// Share of timestamps rendered as epoch seconds instead of ISO-8601.
    pub epoch_timestamp: f64,
    pub user_pool_size: usize,
    pub lookback_days: i64,
}

impl Default for EventRates {
    fn default() -> Self {
        Self {
            null_user_id: 0.05,
            session_reuse: 0.03,
            session_dup_ratio: 0.03,
            session_bucket: 100,
            missing_referrer: 0.30,
            epoch_timestamp: 0.5,
            user_pool_size: 5_000,
            lookback_days: 3 * 365,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRates {
    /// Share of users whose state is written as a full name.
    pub full_state_name: f64,
    /// Share of users whose email is drawn from the reuse bucket.
    pub email_reuse: f64,
    pub email_dup_ratio: f64,
    pub email_bucket: usize,
    pub signup_lookback_days: i64,
}

impl Default for UserRates {
    fn default() -> Self {
        Self {
            full_state_name: 0.30,
            email_reuse: 0.02,
            email_dup_ratio: 0.02,
            email_bucket: 200,
            signup_lookback_days: 5 * 365,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionRates {
    /// Share of transactions whose total is negated (refunds).
    pub negative_total: f64,
    /// Share of transactions dated in the future window.
    pub future_date: f64,
    /// Share of transactions whose id is drawn from the reuse bucket.
    pub id_reuse: f64,
    pub id_dup_ratio: f64,
    pub id_bucket: usize,
    /// Unit price is `catalog * uniform(1 - jitter, 1 + jitter)`.
    pub price_jitter: f64,
    pub max_quantity: i64,
    pub lookback_days: i64,
    pub future_window_days: i64,
}

impl Default for TransactionRates {
    fn default() -> Self {
        Self {
            negative_total: 0.01,
            future_date: 0.02,
            id_reuse: 0.02,
            id_dup_ratio: 0.02,
            id_bucket: 100,
            price_jitter: 0.15,
            max_quantity: 10,
            lookback_days: 3 * 365,
            future_window_days: 180,
        }
    }
}

impl DefectRates {
    pub fn from_toml_str(contents: &str) -> Result<Self, GenerationError> {
        let rates: DefectRates = toml::from_str(contents)?;
        rates.validate()?;
        Ok(rates)
    }

    pub fn load(path: &Path) -> Result<Self, GenerationError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        self.events.validate()?;
        self.users.validate()?;
        self.transactions.validate()
    }
}

impl EventRates {
    pub fn validate(&self) -> Result<(), GenerationError> {
        probability("events.null_user_id", self.null_user_id)?;
        probability("events.session_reuse", self.session_reuse)?;
        probability("events.missing_referrer", self.missing_referrer)?;
        probability("events.epoch_timestamp", self.epoch_timestamp)?;
        dup_ratio("events.session_dup_ratio", self.session_dup_ratio)?;
        positive("events.session_bucket", self.session_bucket as i64)?;
        positive("events.user_pool_size", self.user_pool_size as i64)?;
        window_days("events.lookback_days", self.lookback_days)
    }
}

impl UserRates {
    pub fn validate(&self) -> Result<(), GenerationError> {
        probability("users.full_state_name", self.full_state_name)?;
        probability("users.email_reuse", self.email_reuse)?;
        dup_ratio("users.email_dup_ratio", self.email_dup_ratio)?;
        positive("users.email_bucket", self.email_bucket as i64)?;
        window_days("users.signup_lookback_days", self.signup_lookback_days)
    }
}

impl TransactionRates {
    pub fn validate(&self) -> Result<(), GenerationError> {
        probability("transactions.negative_total", self.negative_total)?;
        probability("transactions.future_date", self.future_date)?;
        probability("transactions.id_reuse", self.id_reuse)?;
        dup_ratio("transactions.id_dup_ratio", self.id_dup_ratio)?;
        positive("transactions.id_bucket", self.id_bucket as i64)?;
        positive("transactions.max_quantity", self.max_quantity)?;
        window_days("transactions.lookback_days", self.lookback_days)?;
        window_days("transactions.future_window_days", self.future_window_days)?;
        if !(0.0..1.0).contains(&self.price_jitter) {
            return Err(GenerationError::config(format!(
                "transactions.price_jitter must be in [0, 1), got {}",
                self.price_jitter
            )));
        }
        Ok(())
    }
}

fn probability(field: &str, value: f64) -> Result<(), GenerationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GenerationError::config(format!(
            "{field} must be in [0, 1], got {value}"
        )))
    }
}

fn dup_ratio(field: &str, value: f64) -> Result<(), GenerationError> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(GenerationError::config(format!(
            "{field} must be in [0, 1), got {value}"
        )))
    }
}

/// Longest date window accepted, in days (about a century).
pub const MAX_WINDOW_DAYS: i64 = 36_500;

fn window_days(field: &str, value: i64) -> Result<(), GenerationError> {
    if (1..=MAX_WINDOW_DAYS).contains(&value) {
        Ok(())
    } else {
        Err(GenerationError::config(format!(
            "{field} must be in [1, {MAX_WINDOW_DAYS}] days, got {value}"
        )))
    }
}

fn positive(field: &str, value: i64) -> Result<(), GenerationError> {
    if value > 0 {
        Ok(())
    } else {
        Err(GenerationError::config(format!(
            "{field} must be positive, got {value}"
        )))
    }
}
