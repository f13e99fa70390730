use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};

use crate::credits::{CreditLedger, CreditReport, render_credit_table};
use crate::errors::{Result, WarehouseError};
use crate::executor::{Row, SqlExecutor, SqlParam};
use crate::schema;

/// Schema lifecycle and tracked queries over one executor.
#[derive(Debug)]
pub struct Warehouse<E> {
    executor: E,
    ledger: CreditLedger,
}

impl<E: SqlExecutor> Warehouse<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            ledger: CreditLedger::new(),
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Apply every `*.sql` file in `dir`, in name order, as one transaction.
    pub async fn setup_schemas(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let (files, statements) = schema::load_statements(dir)?;
        info!(
            dir = %dir.display(),
            files = files.len(),
            statements = statements.len(),
            "applying schema files"
        );
        self.executor.execute_batch(&statements).await?;
        info!(files = files.len(), "schemas applied");
        Ok(files)
    }

    /// Drop the gold, silver and bronze schemas. Requires `confirm`.
    pub async fn drop_all_schemas(&self, confirm: bool) -> Result<()> {
        if !confirm {
            warn!("drop_all_schemas called without confirmation");
            return Err(WarehouseError::ConfirmationRequired);
        }
        self.executor.execute_batch(&schema::drop_statements()).await?;
        info!(schemas = ?schema::MEDALLION_SCHEMAS, "schemas dropped");
        Ok(())
    }

    pub async fn execute_tracked_query(&mut self, sql: &str, label: &str) -> Result<Vec<Row>> {
        self.execute_tracked_query_with(sql, label, &[]).await
    }

    /// Run a query, charging its wall-clock time to the credit ledger.
    pub async fn execute_tracked_query_with(
        &mut self,
        sql: &str,
        label: &str,
        params: &[SqlParam],
    ) -> Result<Vec<Row>> {
        let started = Instant::now();
        let rows = self.executor.fetch_rows(sql, params).await?;
        let entry = self.ledger.record(label, started.elapsed());
        info!(
            label = %entry.label,
            elapsed_s = entry.elapsed_s,
            credits = entry.credits,
            rows = rows.len(),
            "tracked query finished"
        );
        Ok(rows)
    }

    pub fn credit_report(&self) -> CreditReport {
        self.ledger.report()
    }

    pub fn render_credit_report(&self) -> String {
        render_credit_table(&self.ledger.report())
    }
}
