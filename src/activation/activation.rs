use serde::{Serialize, Deserialize};
use std::f64::consts::E;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    Tanh,
    Identity,
    /// Softmax is a vector-valued activation; it is applied row by row at
    /// the layer level through `apply_row()`.
    Softmax,
}

impl ActivationFunction {
    /// Element-wise activation.  For `Softmax`, use `apply_row()`.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::Identity => x,
            ActivationFunction::Softmax => {
                panic!("ActivationFunction::Softmax::function() must not be called directly; \
                        use apply_row() which normalises the full vector.")
            }
        }
    }

    /// Element-wise derivative evaluated at the pre-activation `x`.
    ///
    /// For `Softmax` the output layer pairs it with cross-entropy, whose
    /// gradient is already taken w.r.t. the logits, so `1.0` passes that
    /// delta through unchanged.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            }
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Softmax => 1.0,
        }
    }

    /// Activates a whole row; the only entry point that handles `Softmax`.
    pub fn apply_row(&self, z: &[f64]) -> Vec<f64> {
        match self {
            ActivationFunction::Softmax => softmax(z),
            _ => z.iter().map(|&x| self.function(x)).collect(),
        }
    }
}

/// Numerically stable softmax (shifted by the row maximum).
pub fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = z.iter().map(|&x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one_and_survives_large_logits() {
        let p = ActivationFunction::Softmax.apply_row(&[1000.0, 1001.0, 999.0]);
        let sum: f64 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(p[1] > p[0] && p[0] > p[2]);
    }

    #[test]
    fn tanh_derivative_at_zero_is_one() {
        assert!((ActivationFunction::Tanh.derivative(0.0) - 1.0).abs() < 1e-12);
        assert!((ActivationFunction::Sigmoid.derivative(0.0) - 0.25).abs() < 1e-12);
    }
}
