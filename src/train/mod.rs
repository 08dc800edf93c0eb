pub mod epoch_stats;
pub mod listener;
pub mod loop_fn;
pub mod train_config;
pub mod trainer;

pub use epoch_stats::EpochStats;
pub use listener::{ScoreHistory, ScoreIterationListener, TrainingListener};
pub use loop_fn::train_loop;
pub use train_config::TrainConfig;
pub use trainer::fit_epoch;
