use serde::{Serialize, Deserialize};

use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;

/// Selects which loss function the output layer is trained with.
///
/// - `Mse`          — mean-squared error; pair with an Identity output.
/// - `CrossEntropy` — categorical cross-entropy; pair with a Softmax output.
///
/// Sequence losses are summed over time steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Mse,
    CrossEntropy,
}

impl LossType {
    /// Loss of one `T x n_out` prediction against its labels.
    pub fn sequence_loss(&self, predicted: &Matrix, expected: &Matrix) -> f64 {
        predicted.data.iter().zip(expected.data.iter())
            .map(|(p, e)| match self {
                LossType::Mse          => MseLoss::loss(p, e),
                LossType::CrossEntropy => CrossEntropyLoss::loss(p, e),
            })
            .sum()
    }

    /// Per-time-step gradient, shaped like `predicted`.
    pub fn sequence_gradient(&self, predicted: &Matrix, expected: &Matrix) -> Matrix {
        Matrix::from_data(
            predicted.data.iter().zip(expected.data.iter())
                .map(|(p, e)| match self {
                    LossType::Mse          => MseLoss::derivative(p, e),
                    LossType::CrossEntropy => CrossEntropyLoss::derivative(p, e),
                })
                .collect()
        )
    }
}
