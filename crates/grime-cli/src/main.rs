mod registry;

use std::path::PathBuf;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use grime_core::{DatasetKind, RedactedConnection, redact_connection_string};
use grime_eval::{EvalError, ProfileEngine, ProfileOptions};
use grime_generate::{
    DefectRates, GenerateOptions, GenerationEngine, GenerationError, GenerationReport,
};
use grime_warehouse::{PgExecutor, ProjectPaths, Warehouse, WarehouseConfig, WarehouseError};
use registry::{RunContext, RunPaths, init_run_logging, start_run, write_summary};

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("profile error: {0}")]
    Eval(#[from] EvalError),
    #[error("warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

#[derive(Parser, Debug)]
#[command(name = "grime", version, about = "Calibrated dirty dataset generator")]
struct Cli {
    /// Output directory for run artifacts.
    #[arg(long, global = true, default_value = "runs")]
    run_dir: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the raw datasets.
    Generate(GenerateArgs),
    /// Re-measure defect rates of a dataset directory.
    Profile(ProfileArgs),
    /// Warehouse schema lifecycle and tracked queries.
    #[command(subcommand)]
    Warehouse(WarehouseCommand),
}

#[derive(Args, Debug, Serialize)]
struct GenerateArgs {
    #[arg(long, default_value = grime_warehouse::RAW_DATA_DIR)]
    out_dir: PathBuf,
    #[arg(long, default_value_t = grime_generate::model::DEFAULT_SEED)]
    seed: u64,
    /// Reference date (YYYY-MM-DD); defaults to today in UTC.
    #[arg(long, value_parser = parse_date)]
    as_of: Option<NaiveDate>,
    /// Row count override, e.g. `events=1000`. Repeatable.
    #[arg(long = "rows", value_name = "DATASET=N", value_parser = parse_rows)]
    rows: Vec<(DatasetKind, usize)>,
    /// Datasets to emit (comma separated); defaults to all three.
    #[arg(long, value_delimiter = ',')]
    datasets: Vec<DatasetKind>,
    /// TOML file overriding the default defect rates.
    #[arg(long)]
    rates: Option<PathBuf>,
}

#[derive(Args, Debug, Serialize)]
struct ProfileArgs {
    #[arg(default_value = grime_warehouse::RAW_DATA_DIR)]
    dir: PathBuf,
    /// Fail when any rate check or invariant fails.
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Reference date when the directory has no generation report.
    #[arg(long, value_parser = parse_date)]
    as_of: Option<NaiveDate>,
    /// Where to write profile.json and profile.md; defaults to the dataset dir.
    #[arg(long)]
    out_dir: Option<PathBuf>,
    #[arg(long, default_value_t = 20)]
    max_examples: usize,
}

#[derive(Subcommand, Debug, Serialize)]
enum WarehouseCommand {
    /// Apply every *.sql file in the schema directory.
    Setup {
        #[arg(long)]
        schema_dir: Option<PathBuf>,
    },
    /// Drop the gold, silver and bronze schemas.
    Drop {
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
    /// Run a query and report its credit cost.
    Query {
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        sql: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value = "ad-hoc query")]
        label: String,
    },
}

impl WarehouseCommand {
    fn name(&self) -> &'static str {
        match self {
            WarehouseCommand::Setup { .. } => "warehouse setup",
            WarehouseCommand::Drop { .. } => "warehouse drop",
            WarehouseCommand::Query { .. } => "warehouse query",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(cli.run_dir, args),
        Command::Profile(args) => run_profile(cli.run_dir, args),
        Command::Warehouse(command) => run_warehouse(cli.run_dir, command).await,
    }
}

fn begin_run(
    run_dir: PathBuf,
    command: &str,
    options: serde_json::Value,
    connection: Option<RedactedConnection>,
) -> Result<RunPaths, CliError> {
    let run_id = Uuid::new_v4().to_string();
    let ctx = RunContext {
        run_id: run_id.clone(),
        started_at: Utc::now(),
        command: command.to_string(),
        run_dir,
        options,
        connection,
    };
    let paths = start_run(&ctx)?;
    init_run_logging(&paths.logs_path)?;
    tracing::info!(event = "run_started", run_id = %run_id, command = command);
    Ok(paths)
}

fn run_generate(run_dir: PathBuf, args: GenerateArgs) -> Result<(), CliError> {
    let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let rates = match &args.rates {
        Some(path) => DefectRates::load(path)?,
        None => DefectRates::default(),
    };

    let mut options = GenerateOptions {
        out_dir: args.out_dir.clone(),
        seed: args.seed,
        as_of,
        ..GenerateOptions::default()
    };
    if !args.datasets.is_empty() {
        options.datasets = args.datasets.clone();
    }
    for (dataset, rows) in &args.rows {
        options = options.with_rows(*dataset, *rows);
    }

    let paths = begin_run(
        run_dir,
        "generate",
        json!({ "args": &args, "as_of": as_of, "rates": &rates }),
        None,
    )?;
    let timer = Instant::now();
    let outcome = generate_datasets(options, rates);
    finish_run(&paths, timer, outcome)
}

fn generate_datasets(
    options: GenerateOptions,
    rates: DefectRates,
) -> Result<GenerationReport, CliError> {
    let engine = GenerationEngine::new(options, rates)?;
    let result = engine.run()?;

    for dataset in &result.report.datasets {
        println!(
            "{:<13} {:>7} rows -> {}",
            dataset.dataset,
            dataset.rows_generated,
            result.out_dir.join(&dataset.file_name).display()
        );
    }
    println!("report: {}", result.report_path.display());
    Ok(result.report)
}

fn run_profile(run_dir: PathBuf, args: ProfileArgs) -> Result<(), CliError> {
    let paths = begin_run(run_dir, "profile", json!({ "args": &args }), None)?;
    let timer = Instant::now();

    let engine = ProfileEngine::new(ProfileOptions {
        strict: args.strict,
        max_examples: args.max_examples,
        as_of: args.as_of,
        out_dir: args.out_dir.clone(),
        ..ProfileOptions::default()
    });
    let outcome = engine
        .run(&args.dir)
        .map_err(CliError::from)
        .map(|result| {
            let failed = result.metrics.failed_checks().count();
            println!("{}", result.report);
            println!(
                "rate checks failed: {failed}, violations: {}",
                result.metrics.violations.len()
            );
            println!("metrics: {}", result.metrics_path.display());
            tracing::info!(event = "profile_checked", failed_checks = failed);
            result.metrics
        });
    finish_run(&paths, timer, outcome)
}

async fn run_warehouse(run_dir: PathBuf, command: WarehouseCommand) -> Result<(), CliError> {
    let config = WarehouseConfig::from_env()?;
    let paths = begin_run(
        run_dir,
        command.name(),
        json!({ "args": &command }),
        Some(redact_connection_string(&config.database_url)),
    )?;
    let timer = Instant::now();

    let outcome = warehouse_command(&config, command).await;
    finish_run(&paths, timer, outcome)
}

async fn warehouse_command(
    config: &WarehouseConfig,
    command: WarehouseCommand,
) -> Result<serde_json::Value, CliError> {
    let pool = config.connect().await?;
    let mut warehouse = Warehouse::new(PgExecutor::new(pool));

    let summary = match command {
        WarehouseCommand::Setup { schema_dir } => {
            let dir = match schema_dir {
                Some(dir) => dir,
                None => ProjectPaths::current()?.schema_dir(),
            };
            let applied = warehouse.setup_schemas(&dir).await?;
            for file in &applied {
                println!("applied {}", file.display());
            }
            json!({ "applied": applied })
        }
        WarehouseCommand::Drop { confirm } => {
            warehouse.drop_all_schemas(confirm).await?;
            println!("dropped gold, silver, bronze");
            json!({ "dropped": grime_warehouse::MEDALLION_SCHEMAS })
        }
        WarehouseCommand::Query { sql, file, label } => {
            let sql = match (sql, file) {
                (Some(sql), _) => sql,
                (None, Some(file)) => std::fs::read_to_string(file)?,
                (None, None) => {
                    return Err(CliError::InvalidArgs("pass --sql or --file".to_string()));
                }
            };
            let rows = warehouse.execute_tracked_query(&sql, &label).await?;
            for row in &rows {
                println!("{}", serde_json::to_string(row)?);
            }
            println!("{}", warehouse.render_credit_report());
            json!({ "rows": rows.len(), "credits": warehouse.credit_report() })
        }
    };

    Ok(summary)
}

/// Close the run: write the summary on success, log the terminal event either way.
fn finish_run<T: Serialize>(
    paths: &RunPaths,
    timer: Instant,
    outcome: Result<T, CliError>,
) -> Result<(), CliError> {
    let duration_ms = timer.elapsed().as_millis() as u64;
    let finished = outcome.and_then(|summary| Ok(write_summary(paths, &summary)?));
    match &finished {
        Ok(()) => tracing::info!(event = "run_finished", status = "success", duration_ms),
        Err(err) => {
            tracing::error!(event = "run_finished", status = "failed", duration_ms, error = %err)
        }
    }
    finished
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|err| format!("{value}: {err}"))
}

fn parse_rows(value: &str) -> Result<(DatasetKind, usize), String> {
    let (name, count) = value
        .split_once('=')
        .ok_or_else(|| format!("expected DATASET=N, got '{value}'"))?;
    let dataset = name.trim().parse::<DatasetKind>().map_err(|err| err.to_string())?;
    let rows = count
        .trim()
        .parse::<usize>()
        .map_err(|err| format!("{count}: {err}"))?;
    Ok((dataset, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn rows_overrides_parse() {
        assert_eq!(parse_rows("events=1000").unwrap(), (DatasetKind::Events, 1000));
        assert_eq!(
            parse_rows("sales_transactions = 5").unwrap(),
            (DatasetKind::Transactions, 5)
        );
        assert!(parse_rows("events").is_err());
        assert!(parse_rows("orders=5").is_err());
        assert!(parse_rows("users=-1").is_err());
    }

    #[test]
    fn dates_parse_iso_only() {
        assert_eq!(
            parse_date("2024-01-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert!(parse_date("01/01/2024").is_err());
    }

    #[test]
    fn generate_arguments_resolve() {
        let cli = Cli::try_parse_from([
            "grime",
            "generate",
            "--seed",
            "7",
            "--as-of",
            "2024-06-30",
            "--rows",
            "users=10",
            "--datasets",
            "users,transactions",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.seed, 7);
        assert_eq!(args.rows, vec![(DatasetKind::Users, 10)]);
        assert_eq!(args.datasets, vec![DatasetKind::Users, DatasetKind::Transactions]);
        assert_eq!(args.out_dir, PathBuf::from("data/raw"));
    }

    #[test]
    fn query_requires_sql_or_file() {
        assert!(Cli::try_parse_from(["grime", "warehouse", "query"]).is_err());
        assert!(Cli::try_parse_from(["grime", "warehouse", "query", "--sql", "SELECT 1"]).is_ok());
    }

    #[derive(Clone, Default)]
    struct SharedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for SharedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn finish_with_log<T: Serialize>(outcome: Result<T, CliError>) -> (RunPaths, bool, String) {
        let root = std::env::temp_dir().join(format!("grime_finish_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&root).unwrap();
        let paths = RunPaths {
            config_path: root.join("config.json"),
            logs_path: root.join("logs.ndjson"),
            summary_path: root.join("summary.json"),
            root,
        };
        let log = SharedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(move || writer.clone())
            .finish();
        let ok = tracing::subscriber::with_default(subscriber, || {
            finish_run(&paths, Instant::now(), outcome).is_ok()
        });
        let text = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        (paths, ok, text)
    }

    #[test]
    fn failed_run_logs_terminal_event_without_summary() {
        let outcome: Result<serde_json::Value, CliError> =
            Err(CliError::InvalidArgs("pass --sql or --file".to_string()));
        let (paths, ok, log) = finish_with_log(outcome);

        assert!(!ok);
        assert!(!paths.summary_path.exists());
        assert!(log.contains(r#""event":"run_finished""#), "{log}");
        assert!(log.contains(r#""status":"failed""#), "{log}");
        assert!(log.contains("pass --sql or --file"), "{log}");
        std::fs::remove_dir_all(&paths.root).unwrap();
    }

    #[test]
    fn successful_run_writes_summary() {
        let (paths, ok, log) = finish_with_log(Ok(json!({"rows": 3})));

        assert!(ok);
        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths.summary_path).unwrap()).unwrap();
        assert_eq!(summary["rows"], 3);
        assert!(log.contains(r#""status":"success""#), "{log}");
        std::fs::remove_dir_all(&paths.root).unwrap();
    }
}
