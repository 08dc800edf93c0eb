/// Predictive-maintenance classifier on turbofan sensor data.
///
/// Architecture: LSTM(100, tanh, dropout) → LSTM(50, tanh, dropout) → RnnOutput(2, Softmax)
/// Loss:         cross-entropy per time step
/// Optimizer:    Adam with a one-cycle learning-rate schedule over 75 epochs
/// Batch size:   200 windows of 30 cycles
///
/// Run with:
///   cargo run --example predictive_maintenance --release
///
/// Data files must be present at data/predictive_maintenance/{train,test}.csv.

use ferrite_seq::pipelines::{maintenance, MaintenanceConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let report = maintenance::run(&MaintenanceConfig::default())?;

    println!(
        "Trained on {} windows, evaluated on {} windows",
        report.train_windows, report.test_windows
    );
    println!("{}", report.evaluation.stats());
    Ok(())
}
