use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use ferrite_seq::pipelines::{forecast, maintenance, ForecastConfig, MaintenanceConfig};

#[derive(Parser)]
#[command(name = "ferrite-seq")]
#[command(about = "Recurrent networks for sensor time series: LSTM classification and BiLSTM forecasting")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train the predictive-maintenance LSTM classifier on sensor CSV files
    Classify {
        /// JSON file with a full configuration; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        train: Option<PathBuf>,

        #[arg(long)]
        test: Option<PathBuf>,

        #[arg(long)]
        epochs: Option<usize>,

        #[arg(long)]
        sequence_length: Option<usize>,

        #[arg(long)]
        batch_size: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        /// Write the trained network as JSON
        #[arg(long)]
        save_model: Option<PathBuf>,

        /// Write the fitted min-max scaler as JSON
        #[arg(long)]
        save_scaler: Option<PathBuf>,
    },
    /// Train the univariate bidirectional-LSTM forecaster
    Forecast {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        iterations: Option<usize>,

        #[arg(long)]
        lag: Option<usize>,

        #[arg(long)]
        learning_rate: Option<f64>,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        save_model: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Classify {
            config,
            train,
            test,
            epochs,
            sequence_length,
            batch_size,
            seed,
            save_model,
            save_scaler,
        } => {
            let mut cfg = match config {
                Some(path) => MaintenanceConfig::load_json(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => MaintenanceConfig::default(),
            };
            if let Some(v) = train { cfg.train_path = v; }
            if let Some(v) = test { cfg.test_path = v; }
            if let Some(v) = epochs { cfg.epochs = v; }
            if let Some(v) = sequence_length { cfg.sequence_length = v; }
            if let Some(v) = batch_size { cfg.batch_size = v; }
            if let Some(v) = seed { cfg.seed = v; }
            if save_model.is_some() { cfg.save_model = save_model; }
            if save_scaler.is_some() { cfg.save_scaler = save_scaler; }

            let report = maintenance::run(&cfg).context("predictive maintenance run failed")?;
            info!(
                train_windows = report.train_windows,
                test_windows = report.test_windows,
                epochs = report.epochs_run,
                "done"
            );
            println!("{}", report.evaluation.stats());
        }
        Command::Forecast { config, iterations, lag, learning_rate, seed, save_model } => {
            let mut cfg = match config {
                Some(path) => ForecastConfig::load_json(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => ForecastConfig::default(),
            };
            if let Some(v) = iterations { cfg.iterations = v; }
            if let Some(v) = lag { cfg.lag = v; }
            if let Some(v) = learning_rate { cfg.learning_rate = v; }
            if let Some(v) = seed { cfg.seed = v; }
            if save_model.is_some() { cfg.save_model = save_model; }

            let report = forecast::run(&cfg).context("forecast run failed")?;
            for p in &report.predictions {
                println!("{:?} -> {:.4}", p.input, p.value);
            }
            println!("{}", report.evaluation.stats());
        }
    }

    Ok(())
}
