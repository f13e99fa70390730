use std::fs;
use std::path::PathBuf;

use serde_json::{Value, json};

use grime_warehouse::{
    RecordingExecutor, Row, SqlParam, Warehouse, WarehouseConfig, WarehouseError,
};

fn schema_dir(files: &[(&str, &str)]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("grime_warehouse_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    for (name, body) in files {
        fs::write(dir.join(name), body).unwrap();
    }
    dir
}

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn setup_applies_sorted_files_in_one_batch() {
    let dir = schema_dir(&[
        ("02_silver.sql", "CREATE SCHEMA IF NOT EXISTS silver;\nCREATE TABLE silver.users (id text);"),
        ("01_bronze.sql", "CREATE SCHEMA IF NOT EXISTS bronze;"),
        ("README.txt", "ignored"),
    ]);
    let warehouse = Warehouse::new(RecordingExecutor::new());

    let applied = warehouse.setup_schemas(&dir).await.unwrap();
    assert_eq!(applied.len(), 2);
    assert!(applied[0].ends_with("01_bronze.sql"));

    let batches = warehouse.executor().batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(
        batches[0],
        vec![
            "CREATE SCHEMA IF NOT EXISTS bronze",
            "CREATE SCHEMA IF NOT EXISTS silver",
            "CREATE TABLE silver.users (id text)",
        ]
    );
    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn setup_without_sql_files_touches_nothing() {
    let dir = schema_dir(&[("notes.md", "nothing here")]);
    let warehouse = Warehouse::new(RecordingExecutor::new());

    let err = warehouse.setup_schemas(&dir).await.unwrap_err();
    assert!(matches!(err, WarehouseError::NoSchemaFiles(_)));
    assert!(warehouse.executor().batches().is_empty());
    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn failed_batch_surfaces_database_error() {
    let dir = schema_dir(&[("01.sql", "CREATE SCHEMA bronze;")]);
    let warehouse = Warehouse::new(RecordingExecutor::new().failing());

    let err = warehouse.setup_schemas(&dir).await.unwrap_err();
    assert!(matches!(err, WarehouseError::Sqlx(_)));
    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn drop_requires_confirmation() {
    let warehouse = Warehouse::new(RecordingExecutor::new());

    let err = warehouse.drop_all_schemas(false).await.unwrap_err();
    assert!(matches!(err, WarehouseError::ConfirmationRequired));
    assert!(warehouse.executor().batches().is_empty());

    warehouse.drop_all_schemas(true).await.unwrap();
    let batches = warehouse.executor().batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 3);
    assert!(batches[0][0].contains("gold"));
    assert!(batches[0][2].contains("bronze"));
}

#[tokio::test]
async fn tracked_queries_return_rows_and_charge_credits() {
    let executor = RecordingExecutor::new()
        .with_rows(vec![row(json!({"region": "West", "revenue": 1520.75}))])
        .with_rows(vec![]);
    let mut warehouse = Warehouse::new(executor);

    let rows = warehouse
        .execute_tracked_query("SELECT region, SUM(total_amount) FROM gold.sales GROUP BY 1", "revenue by region")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["region"], json!("West"));

    let rows = warehouse
        .execute_tracked_query_with(
            "SELECT * FROM silver.users WHERE state = $1",
            "users in CA",
            &[SqlParam::Text("CA".to_string())],
        )
        .await
        .unwrap();
    assert!(rows.is_empty());

    let queries = warehouse.executor().queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[1].1, vec![SqlParam::Text("CA".to_string())]);

    let report = warehouse.credit_report();
    let labels: Vec<_> = report.entries.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec!["revenue by region", "users in CA"]);
    for entry in &report.entries {
        assert!(entry.elapsed_s >= 0.0);
        assert!((entry.credits - entry.elapsed_s / 60.0).abs() < 1e-6);
    }

    let rendered = warehouse.render_credit_report();
    assert!(rendered.contains("revenue by region"));
    assert!(rendered.contains("TOTAL"));
}

#[tokio::test]
async fn fresh_warehouse_has_empty_report() {
    let warehouse = Warehouse::new(RecordingExecutor::new());
    let report = warehouse.credit_report();
    assert!(report.entries.is_empty());
    assert_eq!(report.total_credits, 0.0);
    assert_eq!(warehouse.render_credit_report(), "No queries tracked yet.");
}

#[test]
fn pg_executor_is_a_sql_executor() {
    fn assert_executor<E: grime_warehouse::SqlExecutor + Clone + 'static>() {}
    assert_executor::<grime_warehouse::PgExecutor>();
}

#[tokio::test]
async fn unreachable_database_surfaces_as_database_error() {
    use grime_warehouse::PgExecutor;

    let mut config = WarehouseConfig::new("postgres://grime@127.0.0.1:1/grime");
    config.acquire_timeout = std::time::Duration::from_millis(300);
    let warehouse = Warehouse::new(PgExecutor::new(config.pool().expect("lazy pool")));

    let err = warehouse
        .drop_all_schemas(true)
        .await
        .expect_err("nothing listens on port 1");
    assert!(matches!(err, WarehouseError::Sqlx(_)), "{err}");

    let dir = schema_dir(&[("01.sql", "CREATE SCHEMA bronze;")]);
    let err = warehouse.setup_schemas(&dir).await.expect_err("no database");
    assert!(matches!(err, WarehouseError::Sqlx(_)), "{err}");
    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a disposable Postgres"]
async fn live_schema_round_trip() {
    use grime_warehouse::PgExecutor;

    let config = WarehouseConfig::from_env().expect("DATABASE_URL");
    let pool = config.connect().await.expect("connect");
    let mut warehouse = Warehouse::new(PgExecutor::new(pool));

    let dir = schema_dir(&[(
        "01_bronze.sql",
        "CREATE SCHEMA IF NOT EXISTS bronze;\
         CREATE TABLE IF NOT EXISTS bronze.smoke (id int, amount numeric(10,2), seen date);\
         INSERT INTO bronze.smoke VALUES (1, 12.50, DATE '2024-01-01');",
    )]);
    warehouse.setup_schemas(&dir).await.expect("setup");

    let rows = warehouse
        .execute_tracked_query("SELECT id, amount, seen FROM bronze.smoke", "smoke check")
        .await
        .expect("query");
    assert_eq!(rows[0]["id"], json!(1));
    assert_eq!(rows[0]["amount"], json!(12.5));
    assert_eq!(rows[0]["seen"], json!("2024-01-01"));

    warehouse.drop_all_schemas(true).await.expect("drop");
    fs::remove_dir_all(&dir).unwrap();
}
