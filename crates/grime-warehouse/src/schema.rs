use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{Result, WarehouseError};

/// Warehouse layers, in drop order.
pub const MEDALLION_SCHEMAS: [&str; 3] = ["gold", "silver", "bronze"];

/// `*.sql` files directly under `dir`, sorted by file name.
pub fn schema_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(WarehouseError::NoSchemaFiles(dir.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_sql = path.extension().is_some_and(|ext| ext == "sql");
        if is_sql && path.is_file() {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(WarehouseError::NoSchemaFiles(dir.to_path_buf()));
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Split a script on `;`, dropping blank statements.
pub fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read every schema file in order and flatten it into statements.
pub fn load_statements(dir: &Path) -> Result<(Vec<PathBuf>, Vec<String>)> {
    let files = schema_files(dir)?;
    let mut statements = Vec::new();
    for file in &files {
        statements.extend(split_statements(&fs::read_to_string(file)?));
    }
    Ok((files, statements))
}

pub fn drop_statements() -> Vec<String> {
    MEDALLION_SCHEMAS
        .iter()
        .map(|schema| format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
        .collect()
}
