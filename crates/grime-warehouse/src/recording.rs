use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::errors::{Result, WarehouseError};
use crate::executor::{Row, SqlExecutor, SqlParam};

/// In-memory executor that records every call and replays canned rows.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    batches: Mutex<Vec<Vec<String>>>,
    queries: Mutex<Vec<(String, Vec<SqlParam>)>>,
    responses: Mutex<VecDeque<Vec<Row>>>,
    fail_batches: bool,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue rows for the next `fetch_rows` call.
    pub fn with_rows(self, rows: Vec<Row>) -> Self {
        lock(&self.responses).push_back(rows);
        self
    }

    /// Make every batch fail as if the transaction was rolled back.
    pub fn failing(mut self) -> Self {
        self.fail_batches = true;
        self
    }

    /// Committed batches.
    pub fn batches(&self) -> Vec<Vec<String>> {
        lock(&self.batches).clone()
    }

    pub fn queries(&self) -> Vec<(String, Vec<SqlParam>)> {
        lock(&self.queries).clone()
    }
}

#[async_trait]
impl SqlExecutor for RecordingExecutor {
    async fn execute_batch(&self, statements: &[String]) -> Result<()> {
        if self.fail_batches {
            return Err(WarehouseError::Sqlx(sqlx::Error::Protocol(
                "batch rejected by recording executor".to_string(),
            )));
        }
        lock(&self.batches).push(statements.to_vec());
        Ok(())
    }

    async fn fetch_rows(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>> {
        lock(&self.queries).push((sql.to_string(), params.to_vec()));
        Ok(lock(&self.responses).pop_front().unwrap_or_default())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
