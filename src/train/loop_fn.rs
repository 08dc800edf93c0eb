use std::sync::atomic::Ordering;
use std::time::Instant;

use rand::{rngs::StdRng, SeedableRng};
use tracing::debug;

use crate::data::dataset::SequenceDataSet;
use crate::error::Result;
use crate::loss::loss_type::LossType;
use crate::network::network::Network;
use crate::optim::optimizer::Optimizer;
use crate::train::epoch_stats::EpochStats;
use crate::train::listener::TrainingListener;
use crate::train::train_config::TrainConfig;
use crate::train::trainer::fit_epoch;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs and returns the mean training
/// score of the **last completed epoch**.
///
/// # Arguments
/// - `network`    — mutable reference to the network; modified in place
/// - `train`      — training samples
/// - `validation` — optional held-out samples scored after every epoch
/// - `optimizer`  — updater built from the network config (keeps its state)
/// - `config`     — epochs, batching, optional progress channel and stop flag
/// - `listeners`  — notified after every iteration and epoch
///
/// # Early termination
/// The loop breaks early if:
/// - the `progress_tx` receiver has been dropped, **or**
/// - `config.stop_flag` is set to `true`.
pub fn train_loop(
    network: &mut Network,
    train: &SequenceDataSet,
    validation: Option<&SequenceDataSet>,
    optimizer: &mut dyn Optimizer,
    config: &TrainConfig,
    listeners: &mut [&mut dyn TrainingListener],
) -> Result<f64> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut last_train_loss = 0.0;

    for epoch in 1..=config.epochs {
        if stop_requested(config) {
            break;
        }

        let t_start = Instant::now();

        // ── One full pass over the training data ───────────────────────────
        let train_loss = fit_epoch(network, train, optimizer, config, listeners, &mut rng)?;
        last_train_loss = train_loss;

        let elapsed_ms = t_start.elapsed().as_millis() as u64;
        let learning_rate = optimizer.learning_rate(
            network.iteration_count.saturating_sub(1),
            network.epoch_count.saturating_sub(1),
        );

        // ── Accuracy (cross-entropy only) ──────────────────────────────────
        let classifier = network.loss == LossType::CrossEntropy;
        let train_accuracy = classifier.then(|| network.evaluate(train).accuracy());

        // ── Validation ────────────────────────────────────────────────────
        let (val_loss, val_accuracy) = match validation {
            Some(v) if !v.is_empty() => {
                let loss = network.score(&v.features, &v.labels)?;
                let acc = classifier.then(|| network.evaluate(v).accuracy());
                (Some(loss), acc)
            }
            _ => (None, None),
        };

        // ── Emit progress ─────────────────────────────────────────────────
        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss,
            val_loss,
            train_accuracy,
            val_accuracy,
            learning_rate,
            elapsed_ms,
        };
        debug!(
            epoch,
            train_loss,
            val_loss = ?stats.val_loss,
            learning_rate,
            elapsed_ms,
            "epoch complete"
        );

        for listener in listeners.iter_mut() {
            listener.epoch_done(&stats);
        }

        if let Some(ref tx) = config.progress_tx {
            // Receiver gone: stop training.
            if tx.send(stats).is_err() {
                break;
            }
        }

        if stop_requested(config) {
            break;
        }
    }

    Ok(last_train_loss)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn stop_requested(config: &TrainConfig) -> bool {
    config.stop_flag
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::Relaxed))
}
