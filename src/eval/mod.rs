pub mod evaluation;
pub mod regression;

pub use evaluation::{ConfusionMatrix, Evaluation};
pub use regression::RegressionEvaluation;
