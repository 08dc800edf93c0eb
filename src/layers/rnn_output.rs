use rand::rngs::StdRng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::layers::init::WeightInit;
use crate::layers::param::Param;
use crate::math::matrix::Matrix;

/// Time-distributed dense output layer: the same `n_in x n_out` projection
/// and activation applied independently to every time step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RnnOutputLayer {
    pub n_in: usize,
    pub n_out: usize,
    pub activation: ActivationFunction,
    pub weights: Param,
    pub biases: Param,
    #[serde(skip)]
    input: Matrix,
    #[serde(skip)]
    pre_activation: Matrix,  // z = xW + b, needed for the activation derivative
}

impl RnnOutputLayer {
    pub fn new(
        n_in: usize,
        n_out: usize,
        activation: ActivationFunction,
        weight_init: WeightInit,
        rng: &mut StdRng,
    ) -> RnnOutputLayer {
        RnnOutputLayer {
            n_in,
            n_out,
            activation,
            weights: Param::weight(weight_init.init(n_in, n_out, rng)),
            biases: Param::bias(Matrix::zeros(1, n_out)),
            input: Matrix::default(),
            pre_activation: Matrix::default(),
        }
    }

    pub fn feed_from(&mut self, input: &Matrix) -> Matrix {
        assert_eq!(input.cols, self.n_in, "output layer expected {} inputs, got {}", self.n_in, input.cols);
        let mut z = input.matmul(&self.weights.value);
        for t in 0..z.rows {
            z.add_to_row(t, &self.biases.value.data[0]);
        }
        let a = Matrix::from_data(z.data.iter().map(|row| self.activation.apply_row(row)).collect());
        self.input = input.clone();
        self.pre_activation = z;
        a
    }

    /// `delta` is ∂L/∂a per time step (for Softmax + cross-entropy, already
    /// ∂L/∂z). Accumulates gradients and returns ∂L/∂input.
    pub fn backprop(&mut self, delta: &Matrix) -> Matrix {
        let act_derivative = self.pre_activation.map(|x| self.activation.derivative(x));
        let layer_delta = delta.hadamard(&act_derivative);

        self.weights.grad.add_assign(&self.input.transpose().matmul(&layer_delta));
        self.biases.grad.add_assign(&layer_delta.sum_rows());

        layer_delta.matmul(&self.weights.value.transpose())
    }

    pub fn params(&self) -> Vec<&Param> {
        vec![&self.weights, &self.biases]
    }

    pub fn params_mut(&mut self) -> Vec<&mut Param> {
        vec![&mut self.weights, &mut self.biases]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn softmax_rows_are_distributions() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut layer = RnnOutputLayer::new(3, 2, ActivationFunction::Softmax, WeightInit::Xavier, &mut rng);
        let out = layer.feed_from(&Matrix::from_data(vec![vec![1.0, 2.0, 3.0], vec![-1.0, 0.0, 1.0]]));
        for row in &out.data {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn identity_gradients_accumulate_over_time_steps() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut layer = RnnOutputLayer::new(2, 1, ActivationFunction::Identity, WeightInit::Xavier, &mut rng);
        layer.feed_from(&Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]));
        layer.backprop(&Matrix::from_data(vec![vec![1.0], vec![1.0]]));
        assert_eq!(layer.weights.grad.data, vec![vec![4.0], vec![6.0]]);
        assert_eq!(layer.biases.grad.data, vec![vec![2.0]]);
    }
}
