use std::fmt::Write as _;
use std::path::Path;

use ferrite_seq::pipelines::{forecast, maintenance, ForecastConfig, MaintenanceConfig};
use ferrite_seq::{Network, SeqError};

const HEADER: &str = "id,cycle,setting1,setting2,setting3,s1,s2,s3,s4,s5,s6,s7,s8,s9,s10,\
s11,s12,s13,s14,s15,s16,s17,s18,s19,s20,s21,cycle_norm,RUL,label1,label2";

/// Writes a sensor file with one engine per entry of `cycles`. Rows are
/// emitted newest-first so the loader has to sort them.
fn write_sensor_csv(path: &Path, cycles: &[usize]) {
    let mut out = String::from(HEADER);
    out.push('\n');
    for (engine, &total) in cycles.iter().enumerate() {
        let id = engine + 1;
        for cycle in (1..=total).rev() {
            let rul = total - cycle;
            let wear = cycle as f64 / total as f64;
            write!(out, "{id},{cycle},{:.4},{:.4},100.0", 0.001 * id as f64, -0.0003 * cycle as f64).unwrap();
            for s in 1..=21 {
                write!(out, ",{:.4}", 500.0 + s as f64 * 3.0 + wear * s as f64).unwrap();
            }
            let label1 = u8::from(rul < 3);
            let label2 = u8::from(rul < 2);
            writeln!(out, ",{wear:.4},{rul},{label1},{label2}").unwrap();
        }
    }
    std::fs::write(path, out).unwrap();
}

fn small_maintenance_config(dir: &Path) -> MaintenanceConfig {
    let train_path = dir.join("train.csv");
    let test_path = dir.join("test.csv");
    write_sensor_csv(&train_path, &[8, 7, 6]);
    write_sensor_csv(&test_path, &[6, 5]);
    MaintenanceConfig {
        train_path,
        test_path,
        sequence_length: 4,
        batch_size: 4,
        epochs: 3,
        lstm_sizes: vec![6, 4],
        save_model: Some(dir.join("model.json")),
        save_scaler: Some(dir.join("scaler.json")),
        ..MaintenanceConfig::default()
    }
}

#[test]
fn maintenance_pipeline_trains_and_evaluates_every_window_step() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_maintenance_config(dir.path());

    let report = maintenance::run(&config).unwrap();

    assert_eq!(report.train_windows, 4 + 3 + 2);
    assert_eq!(report.test_windows, 2 + 1);
    assert_eq!(report.epochs_run, 3);
    assert!(report.final_score.is_finite());
    assert_eq!(report.evaluation.total(), 3 * 4);
    assert_eq!(report.network.n_in(), 20);
    assert_eq!(report.network.n_out(), 2);

    let saved = Network::load_json(dir.path().join("model.json")).unwrap();
    assert_eq!(saved.num_params(), report.network.num_params());
    assert!(dir.path().join("scaler.json").exists());
}

#[test]
fn maintenance_runs_are_reproducible_for_a_seed() {
    let dir = tempfile::tempdir().unwrap();
    let config = MaintenanceConfig { save_model: None, save_scaler: None, ..small_maintenance_config(dir.path()) };

    let first = maintenance::run(&config).unwrap();
    let second = maintenance::run(&config).unwrap();
    assert_eq!(first.final_score, second.final_score);
    assert_eq!(first.evaluation, second.evaluation);
}

#[test]
fn maintenance_reports_missing_and_malformed_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = small_maintenance_config(dir.path());

    config.train_path = dir.path().join("absent.csv");
    assert!(matches!(maintenance::run(&config), Err(SeqError::Io(_))));

    let bad = dir.path().join("bad.csv");
    std::fs::write(&bad, format!("{HEADER}\n1,1,x{}\n", ",0".repeat(27))).unwrap();
    config.train_path = bad;
    assert!(matches!(maintenance::run(&config), Err(SeqError::Parse { .. })));
}

#[test]
fn maintenance_with_sequences_too_short_for_a_window_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let config = MaintenanceConfig { sequence_length: 8, ..small_maintenance_config(dir.path()) };
    assert!(matches!(maintenance::run(&config), Err(SeqError::EmptyDataset(_))));
}

#[test]
fn forecast_pipeline_reduces_score_and_predicts_each_input() {
    let config = ForecastConfig {
        hidden_size: 8,
        learning_rate: 0.01,
        iterations: 300,
        ..ForecastConfig::default()
    };

    let dataset = ferrite_seq::LaggedSeries::new(&config.series, config.lag).to_dataset();
    let mut untrained = Network::new(forecast::network_config(&config)).unwrap();
    let initial = untrained.score(&dataset.features, &dataset.labels).unwrap();

    let report = forecast::run(&config).unwrap();

    assert_eq!(report.network.iteration_count, 300);
    assert!(report.final_score < initial);
    assert_eq!(report.evaluation.count(), 6);
    let inputs: Vec<Vec<f64>> = report.predictions.iter().map(|p| p.input.clone()).collect();
    assert_eq!(inputs, config.test_inputs);
    assert!(report.predictions.iter().all(|p| p.value.is_finite()));
}
