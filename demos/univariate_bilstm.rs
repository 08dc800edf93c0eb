/// Univariate forecasting with a bidirectional LSTM.
///
/// Series:       10, 20, ..., 90 split into lag-3 windows
/// Architecture: BiLSTM(50, tanh) → RnnOutput(1, Identity)
/// Optimizer:    RmsProp, lr = 0.001, 10 000 full-batch iterations
///
/// Run with:
///   cargo run --example univariate_bilstm --release

use ferrite_seq::pipelines::{forecast, ForecastConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let report = forecast::run(&ForecastConfig::default())?;

    for p in &report.predictions {
        println!("Input: {:?} -> Output: {:.4}", p.input, p.value);
    }
    println!("Final score: {:.6}", report.final_score);
    Ok(())
}
