use crate::layers::param::Param;
use crate::math::matrix::Matrix;
use crate::optim::optimizer::{ensure_state, Optimizer};
use crate::optim::schedule::LearningRate;

/// Adam with bias-corrected step size:
///
/// ```text
/// m = β1·m + (1-β1)·g
/// v = β2·v + (1-β2)·g²
/// w -= lr · sqrt(1-β2^t) / (1-β1^t) · m / (sqrt(v) + ε)
/// ```
pub struct Adam {
    pub learning_rate: LearningRate,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    m: Vec<Matrix>,
    v: Vec<Matrix>,
}

impl Adam {
    pub fn new(learning_rate: impl Into<LearningRate>) -> Adam {
        Adam {
            learning_rate: learning_rate.into(),
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            m: Vec::new(),
            v: Vec::new(),
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [&mut Param], iteration: usize, epoch: usize) {
        ensure_state(&mut self.m, params);
        ensure_state(&mut self.v, params);

        let t = (iteration + 1) as i32;
        let lr = self.learning_rate.value_at(iteration, epoch);
        let alpha = lr * (1.0 - self.beta2.powi(t)).sqrt() / (1.0 - self.beta1.powi(t));

        for (idx, param) in params.iter_mut().enumerate() {
            let (m, v) = (&mut self.m[idx], &mut self.v[idx]);
            for r in 0..param.value.rows {
                for c in 0..param.value.cols {
                    let g = param.grad.data[r][c];
                    let m_rc = self.beta1 * m.data[r][c] + (1.0 - self.beta1) * g;
                    let v_rc = self.beta2 * v.data[r][c] + (1.0 - self.beta2) * g * g;
                    m.data[r][c] = m_rc;
                    v.data[r][c] = v_rc;
                    param.value.data[r][c] -= alpha * m_rc / (v_rc.sqrt() + self.epsilon);
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
    fn first_step_moves_each_weight_by_about_lr() {
        let mut p = Param::weight(Matrix::from_data(vec![vec![1.0, -1.0]]));
        p.grad = Matrix::from_data(vec![vec![0.5, -2.0]]);
        let mut adam = Adam::new(0.01);
        adam.step(&mut [&mut p], 0, 0);
        assert!((p.value.data[0][0] - 0.99).abs() < 1e-6);
        assert!((p.value.data[0][1] + 0.99).abs() < 1e-6);
    }
}
