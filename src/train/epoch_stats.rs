use serde::{Serialize, Deserialize};

/// Per-epoch training statistics emitted by `train_loop`.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the training
/// loop sends one `EpochStats` value at the end of every completed epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number within this run.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean batch score over this epoch.
    pub train_loss: f64,
    /// Validation score, if a validation set was provided.
    pub val_loss: Option<f64>,
    /// Training accuracy in [0, 1]; only set for cross-entropy networks.
    pub train_accuracy: Option<f64>,
    /// Validation accuracy in [0, 1]; only set for cross-entropy networks
    /// when a validation set is available.
    pub val_accuracy: Option<f64>,
    /// Learning rate used during this epoch's final update.
    pub learning_rate: f64,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
