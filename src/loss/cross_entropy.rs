/// Categorical cross-entropy loss for use with a Softmax output layer.
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

impl CrossEntropyLoss {
    /// L = -sum(expected[i] * log(predicted[i] + eps)) for one time step.
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| -e * (p + EPS).ln())
            .sum()
    }

    /// Gradient of Softmax + cross-entropy w.r.t. the logits:
    ///   ∂L/∂z_i = predicted[i] - expected[i]
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| p - e)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confident_correct_prediction_has_small_loss() {
        let good = CrossEntropyLoss::loss(&[0.99, 0.01], &[1.0, 0.0]);
        let bad = CrossEntropyLoss::loss(&[0.01, 0.99], &[1.0, 0.0]);
        assert!(good < 0.02);
        assert!(bad > 4.0);
        assert_eq!(CrossEntropyLoss::derivative(&[0.75, 0.25], &[1.0, 0.0]), vec![-0.25, 0.25]);
    }
}
