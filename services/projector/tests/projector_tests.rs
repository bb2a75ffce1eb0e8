//! End-to-end tests of the projector: JSON file in, JSON maps out.

use projector::{run, ProjectionOptions, ProjectorConfig, RunArgs};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use test_utils::{assert_approx_eq, two_level_table, write_table_json, TWO_LEVEL_TOTAL};

fn sequential_config() -> ProjectorConfig {
    let mut config = ProjectorConfig::default();
    config.projection.max_threads = 1;
    config
}

fn options(vars: &[&str]) -> ProjectionOptions {
    ProjectionOptions {
        variables: vars.iter().map(|v| v.to_string()).collect(),
        resolution: Some(4),
        ..ProjectionOptions::default()
    }
}

#[test]
fn test_run_writes_json_output() {
    let input = write_table_json(&two_level_table());
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("maps.json");

    let args = RunArgs {
        input: input.path().to_path_buf(),
        output: Some(output.clone()),
        options: ProjectionOptions {
            weighting: "none".to_string(),
            mode: "sum".to_string(),
            ..options(&["rho"])
        },
    };
    let maps = run(&args, &sequential_config()).unwrap();
    assert_approx_eq!(maps.map("rho").unwrap().sum(), TWO_LEVEL_TOTAL, 1e-12);

    let written: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(written["metadata"]["resolution"], 4);
    assert_eq!(written["modes"]["rho"], "summed");
    assert_eq!(written["units"]["rho"], "standard");
}

#[test]
fn test_run_uses_config_units() {
    let input = write_table_json(&two_level_table());
    let mut config = sequential_config();
    config.units.insert("half".to_string(), 0.5);

    let args = RunArgs {
        input: input.path().to_path_buf(),
        output: None,
        options: ProjectionOptions {
            units: vec!["half".to_string()],
            ..options(&["mass"])
        },
    };
    let maps = run(&args, &config).unwrap();
    assert_approx_eq!(maps.map("mass").unwrap().sum(), 1.0, 1e-12);
    assert_eq!(maps.unit("mass"), Some("half"));
}

#[test]
fn test_run_applies_input_mask() {
    let mut file = NamedTempFile::new().unwrap();
    let json = r#"{
        "boxlen": 1.0,
        "cx": [1, 4], "cy": [1, 4], "cz": [1, 1],
        "level": [1, 2],
        "columns": {"mass": [1.0, 2.0]},
        "mask": [false, true]
    }"#;
    file.write_all(json.as_bytes()).unwrap();

    let args = RunArgs {
        input: file.path().to_path_buf(),
        output: None,
        options: options(&["mass"]),
    };
    let maps = run(&args, &sequential_config()).unwrap();
    assert_approx_eq!(maps.map("mass").unwrap().sum(), 2.0, 1e-12);
}

#[test]
fn test_run_reports_missing_input() {
    let dir = TempDir::new().unwrap();
    let args = RunArgs {
        input: dir.path().join("absent.json"),
        output: None,
        options: options(&["mass"]),
    };
    let err = run(&args, &sequential_config()).unwrap_err();
    assert!(err.to_string().contains("Failed to read input file"));
}

#[test]
fn test_run_reports_projection_error() {
    let input = write_table_json(&two_level_table());
    let args = RunArgs {
        input: input.path().to_path_buf(),
        output: None,
        options: ProjectionOptions {
            weighting: "volume".to_string(),
            ..options(&["sd"])
        },
    };
    let err = run(&args, &sequential_config()).unwrap_err();
    assert!(err.to_string().contains("Projection failed"));
}

#[test]
fn test_config_file_round_trip() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "projection:\n  max_threads: 3\nlogging:\n  level: warn").unwrap();
    let config = ProjectorConfig::load(file.path()).unwrap();
    assert_eq!(config.projection.max_threads, 3);
    assert_eq!(config.logging.level, "warn");
}
