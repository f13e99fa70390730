use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::NaiveDate;

use grime_core::{DatasetKind, PhoneFormat};
use grime_generate::output::field_names;
use grime_generate::{
    Dataset, DefectRates, GenerateOptions, GenerationEngine, GenerationReport, REPORT_FILE,
    ScriptedFaker,
};

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("grime_round_trip_{}", uuid::Uuid::new_v4()))
}

fn engine(out_dir: PathBuf) -> GenerationEngine {
    let options = GenerateOptions {
        out_dir,
        seed: 7,
        as_of: NaiveDate::from_ymd_opt(2023, 12, 31).expect("date"),
        ..GenerateOptions::default()
    }
    .with_rows(DatasetKind::Events, 500)
    .with_rows(DatasetKind::Users, 400)
    .with_rows(DatasetKind::Transactions, 300);
    GenerationEngine::new(options, DefectRates::default()).expect("engine")
}

#[test]
fn written_files_parse_back_to_the_in_memory_datasets() {
    let dir = scratch_dir();
    let engine = engine(dir.clone());
    let result = engine
        .run_with_faker(&ScriptedFaker::new())
        .expect("generation run");

    for dataset in DatasetKind::ALL {
        let expected = engine
            .generate(dataset, &ScriptedFaker::new())
            .expect("in-memory dataset");
        let read = Dataset::read(dataset, &dir).expect("read dataset");
        assert_eq!(read.len(), engine.options().rows_for(dataset));
        assert_eq!(read, expected.dataset, "{dataset}");

        let data = std::fs::read(dir.join(dataset.file_name())).expect("raw bytes");
        let fields: BTreeSet<String> = field_names(dataset, &data)
            .expect("field names")
            .into_iter()
            .collect();
        let declared: BTreeSet<String> =
            dataset.fields().iter().map(|field| field.to_string()).collect();
        assert_eq!(fields, declared, "{dataset}");

        let report = result.report.dataset(dataset).expect("dataset report");
        assert_eq!(report.rows_generated, read.len() as u64);
        assert_eq!(report.bytes_written, data.len() as u64);
    }

    let loaded = GenerationReport::load(&dir.join(REPORT_FILE)).expect("report");
    assert_eq!(loaded, result.report);
    assert_eq!(loaded.seed, 7);

    let leftovers = std::fs::read_dir(&dir)
        .expect("list")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn scripted_faker_values_reach_the_records() {
    let dir = scratch_dir();
    let engine = engine(dir);
    let generated = engine
        .generate(DatasetKind::Users, &ScriptedFaker::new())
        .expect("users");
    let Dataset::Users(users) = generated.dataset else {
        panic!("expected users");
    };
    for user in &users {
        assert!(user.email.starts_with("user"), "{}", user.email);
        assert!(user.email.ends_with("@example.test"), "{}", user.email);
        assert!(PhoneFormat::detect(&user.phone).is_some(), "{}", user.phone);
        assert!(["Springfield", "Riverton", "Fairview"].contains(&user.city.as_str()));
    }
}

#[test]
fn failed_configuration_writes_nothing() {
    let dir = scratch_dir();
    let options = GenerateOptions {
        out_dir: dir.clone(),
        ..GenerateOptions::default()
    }
    .with_rows(DatasetKind::Events, 0);
    assert!(GenerationEngine::new(options, DefectRates::default()).is_err());
    assert!(!dir.exists());
}
