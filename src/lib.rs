pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod data;
pub mod preprocessing;
pub mod eval;
pub mod train;
pub mod pipelines;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::{Layer, WeightInit};
pub use network::{LayerSpec, Network, NetworkConfig};
pub use loss::loss_type::LossType;
pub use optim::{CycleSchedule, LearningRate, Optimizer, ScheduleType, Updater};
pub use data::{CsvRecordReader, LaggedSeries, Schema, SequenceDataSet, TransformProcess};
pub use preprocessing::MinMaxScaler;
pub use eval::{Evaluation, RegressionEvaluation};
pub use train::{fit_epoch, train_loop, ScoreIterationListener, TrainConfig};
pub use error::{Result, SeqError};
