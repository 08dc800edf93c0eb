use crate::layers::param::Param;
use crate::math::matrix::Matrix;
use crate::optim::optimizer::{ensure_state, Optimizer};
use crate::optim::schedule::LearningRate;

/// RMSProp: `s = ρ·s + (1-ρ)·g²`, `w -= lr · g / sqrt(s + ε)`.
pub struct RmsProp {
    pub learning_rate: LearningRate,
    pub decay: f64,
    pub epsilon: f64,
    mean_square: Vec<Matrix>,
}

impl RmsProp {
    pub fn new(learning_rate: impl Into<LearningRate>) -> RmsProp {
        RmsProp {
            learning_rate: learning_rate.into(),
            decay: 0.95,
            epsilon: 1e-8,
            mean_square: Vec::new(),
        }
    }
}

impl Optimizer for RmsProp {
    fn step(&mut self, params: &mut [&mut Param], iteration: usize, epoch: usize) {
        ensure_state(&mut self.mean_square, params);
        let lr = self.learning_rate.value_at(iteration, epoch);

        for (idx, param) in params.iter_mut().enumerate() {
            let s = &mut self.mean_square[idx];
            for r in 0..param.value.rows {
                for c in 0..param.value.cols {
                    let g = param.grad.data[r][c];
                    let s_rc = self.decay * s.data[r][c] + (1.0 - self.decay) * g * g;
                    s.data[r][c] = s_rc;
                    param.value.data[r][c] -= lr * g / (s_rc + self.epsilon).sqrt();
                }
            }
        }
    }

    fn learning_rate(&self, iteration: usize, epoch: usize) -> f64 {
        self.learning_rate.value_at(iteration, epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_is_normalised_by_gradient_magnitude() {
        let mut small = Param::weight(Matrix::zeros(1, 1));
        small.grad = Matrix::filled(1, 1, 0.1);
        let mut large = Param::weight(Matrix::zeros(1, 1));
        large.grad = Matrix::filled(1, 1, 100.0);

        RmsProp::new(0.001).step(&mut [&mut small], 0, 0);
        RmsProp::new(0.001).step(&mut [&mut large], 0, 0);
        assert!((small.value.data[0][0] - large.value.data[0][0]).abs() < 1e-6);
    }
}
