use tracing::info;

use crate::train::epoch_stats::EpochStats;

/// Hook invoked by the training loop.
pub trait TrainingListener {
    /// Called after every parameter update with the batch score.
    fn iteration_done(&mut self, iteration: usize, epoch: usize, score: f64);

    fn epoch_done(&mut self, _stats: &EpochStats) {}
}

/// Logs the score every `frequency` iterations.
pub struct ScoreIterationListener {
    frequency: usize,
}

impl ScoreIterationListener {
    pub fn new(frequency: usize) -> Self {
        ScoreIterationListener { frequency: frequency.max(1) }
    }
}

impl TrainingListener for ScoreIterationListener {
    fn iteration_done(&mut self, iteration: usize, epoch: usize, score: f64) {
        if iteration % self.frequency == 0 {
            info!(iteration, epoch, "Score at iteration {iteration} is {score}");
        }
    }
}

/// Keeps every `frequency`-th score in memory, e.g. for plotting a loss curve.
#[derive(Debug, Default)]
pub struct ScoreHistory {
    frequency: usize,
    pub scores: Vec<(usize, f64)>,
}

impl ScoreHistory {
    pub fn new(frequency: usize) -> Self {
        ScoreHistory { frequency: frequency.max(1), scores: Vec::new() }
    }

    pub fn last(&self) -> Option<f64> {
        self.scores.last().map(|&(_, s)| s)
    }
}

impl TrainingListener for ScoreHistory {
    fn iteration_done(&mut self, iteration: usize, _epoch: usize, score: f64) {
        if iteration % self.frequency == 0 {
            self.scores.push((iteration, score));
        }
    }
}
