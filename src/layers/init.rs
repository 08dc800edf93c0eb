use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

/// Weight initialisation scheme applied to every weight matrix of a network.
/// Biases always start at zero (LSTM forget gates at one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightInit {
    /// Glorot normal, N(0, 2 / (fan_in + fan_out)).
    #[default]
    Xavier,
    /// U(-1, 1).
    Uniform,
}

impl WeightInit {
    pub fn init<R: Rng>(&self, fan_in: usize, fan_out: usize, rng: &mut R) -> Matrix {
        match self {
            WeightInit::Xavier => Matrix::xavier(fan_in, fan_out, rng),
            WeightInit::Uniform => Matrix::uniform(fan_in, fan_out, rng),
        }
    }
}
