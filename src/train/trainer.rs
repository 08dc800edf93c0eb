use rand::{rngs::StdRng, seq::SliceRandom};

use crate::data::dataset::SequenceDataSet;
use crate::error::{Result, SeqError};
use crate::network::network::Network;
use crate::optim::optimizer::Optimizer;
use crate::train::listener::TrainingListener;
use crate::train::train_config::TrainConfig;

/// Runs one full pass over `dataset` in mini-batches of `config.batch_size`
/// and returns the mean batch score. Increments the network's epoch counter.
pub fn fit_epoch(
    network: &mut Network,
    dataset: &SequenceDataSet,
    optimizer: &mut dyn Optimizer,
    config: &TrainConfig,
    listeners: &mut [&mut dyn TrainingListener],
    rng: &mut StdRng,
) -> Result<f64> {
    if dataset.is_empty() {
        return Err(SeqError::EmptyDataset("training set has no samples".into()));
    }
    if config.batch_size == 0 {
        return Err(SeqError::Config("batch_size must be at least 1".into()));
    }

    let mut indices: Vec<usize> = (0..dataset.len()).collect();
    if config.shuffle {
        indices.shuffle(rng);
    }

    let mut total_score = 0.0;
    let mut batches = 0usize;

    for chunk in indices.chunks(config.batch_size) {
        let (features, labels) = dataset.select(chunk);
        let score = network.fit_batch(&features, &labels, optimizer, Some(&mut *rng))?;

        let iteration = network.iteration_count - 1;
        for listener in listeners.iter_mut() {
            listener.iteration_done(iteration, network.epoch_count, score);
        }

        total_score += score;
        batches += 1;
    }

    network.epoch_count += 1;
    Ok(total_score / batches as f64)
}
