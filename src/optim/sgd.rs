use crate::layers::param::Param;
use crate::optim::optimizer::Optimizer;
use crate::optim::schedule::LearningRate;

/// Plain gradient descent: `w -= lr · g`.
pub struct Sgd {
    pub learning_rate: LearningRate,
}

impl Sgd {
    pub fn new(learning_rate: impl Into<LearningRate>) -> Sgd {
        Sgd { learning_rate: learning_rate.into() }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut [&mut Param], iteration: usize, epoch: usize) {
        let lr = self.learning_rate.value_at(iteration, epoch);
        for param in params.iter_mut() {
            let grad = &param.grad;
            for (row, g_row) in param.value.data.iter_mut().zip(grad.data.iter()) {
                for (w, g) in row.iter_mut().zip(g_row.iter()) {
                    *w -= lr * g;
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
    use crate::math::matrix::Matrix;
    use crate::optim::schedule::{MapSchedule, ScheduleType};
    use std::collections::BTreeMap;

    #[test]
    fn step_subtracts_scaled_gradient() {
        let mut w = Param::weight(Matrix::from_data(vec![vec![1.0, -1.0]]));
        w.grad = Matrix::from_data(vec![vec![0.5, -2.0]]);
        let mut b = Param::bias(Matrix::from_data(vec![vec![0.0]]));
        b.grad = Matrix::from_data(vec![vec![1.0]]);

        let mut sgd = Sgd::new(0.1);
        sgd.step(&mut [&mut w, &mut b], 0, 0);

        assert!((w.value.data[0][0] - 0.95).abs() < 1e-12);
        assert!((w.value.data[0][1] + 0.8).abs() < 1e-12);
        assert!((b.value.data[0][0] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn step_follows_the_schedule() {
        let schedule = MapSchedule::new(ScheduleType::Iteration, BTreeMap::from([(0, 1.0), (5, 0.5)])).unwrap();
        let mut sgd = Sgd::new(LearningRate::Map(schedule));
        let mut p = Param::weight(Matrix::from_data(vec![vec![0.0]]));
        p.grad = Matrix::from_data(vec![vec![1.0]]);
        sgd.step(&mut [&mut p], 7, 0);
        assert_eq!(p.value.data[0][0], -0.5);
        assert_eq!(sgd.learning_rate(0, 0), 1.0);
    }
}
