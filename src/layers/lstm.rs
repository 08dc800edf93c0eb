use rand::{rngs::StdRng, Rng};
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::layers::init::WeightInit;
use crate::layers::param::Param;
use crate::math::matrix::Matrix;

/// Long short-term memory layer.
///
/// Consumes a `T x n_in` sequence and emits the hidden state of every time
/// step as a `T x n_out` matrix. Gate pre-activations are packed as
/// `[input | forget | output | candidate]`, each block `n_out` wide:
///
/// ```text
/// z_t = x_t · W + h_{t-1} · U + b
/// i, f, o = σ(z_i), σ(z_f), σ(z_o)      g = act(z_g)
/// c_t = f ⊙ c_{t-1} + i ⊙ g
/// h_t = o ⊙ act(c_t)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmLayer {
    pub n_in: usize,
    pub n_out: usize,
    pub activation: ActivationFunction,
    /// Probability of keeping each input value during training.
    pub retain_prob: Option<f64>,
    pub input_weights: Param,
    pub recurrent_weights: Param,
    pub bias: Param,
    #[serde(skip)]
    steps: Vec<StepCache>,
    #[serde(skip)]
    dropout_mask: Option<Matrix>,
}

/// Everything the backward pass needs from one forward time step.
#[derive(Debug, Clone)]
struct StepCache {
    x: Vec<f64>,
    h_prev: Vec<f64>,
    c_prev: Vec<f64>,
    z: Vec<f64>,
    gates: Vec<f64>,
    c: Vec<f64>,
}

const FORGET_GATE_BIAS: f64 = 1.0;

impl LstmLayer {
    pub fn new(
        n_in: usize,
        n_out: usize,
        activation: ActivationFunction,
        retain_prob: Option<f64>,
        weight_init: WeightInit,
        rng: &mut StdRng,
    ) -> LstmLayer {
        let input_weights = Param::weight(weight_init.init(n_in, 4 * n_out, rng));
        let recurrent_weights = Param::weight(weight_init.init(n_out, 4 * n_out, rng));
        let mut bias = Matrix::zeros(1, 4 * n_out);
        for j in n_out..2 * n_out {
            bias.data[0][j] = FORGET_GATE_BIAS;
        }

        LstmLayer {
            n_in,
            n_out,
            activation,
            retain_prob,
            input_weights,
            recurrent_weights,
            bias: Param::bias(bias),
            steps: Vec::new(),
            dropout_mask: None,
        }
    }

    /// Runs the sequence through the layer, caching per-step state for
    /// `backward()`. Dropout is applied only when `rng` is given.
    pub fn forward(&mut self, input: &Matrix, rng: Option<&mut StdRng>) -> Matrix {
        assert_eq!(input.cols, self.n_in, "LSTM expected {} input features, got {}", self.n_in, input.cols);

        let x_in = match (self.retain_prob, rng) {
            (Some(p), Some(rng)) if p < 1.0 => {
                let mask = dropout_mask(input.rows, input.cols, p, rng);
                let dropped = input.hadamard(&mask);
                self.dropout_mask = Some(mask);
                dropped
            }
            _ => {
                self.dropout_mask = None;
                input.clone()
            }
        };

        let h_size = self.n_out;
        let mut h = vec![0.0; h_size];
        let mut c = vec![0.0; h_size];
        let mut output = Matrix::zeros(input.rows, h_size);
        self.steps.clear();

        for t in 0..x_in.rows {
            let x = x_in.row(t).to_vec();
            let mut z = self.input_weights.value.vec_mul(&x);
            let zh = self.recurrent_weights.value.vec_mul(&h);
            for (k, zk) in z.iter_mut().enumerate() {
                *zk += zh[k] + self.bias.value.data[0][k];
            }

            let gates: Vec<f64> = z.iter().enumerate()
                .map(|(k, &zk)| {
                    if k < 3 * h_size {
                        ActivationFunction::Sigmoid.function(zk)
                    } else {
                        self.activation.function(zk)
                    }
                })
                .collect();

            let c_new: Vec<f64> = (0..h_size)
                .map(|j| gates[h_size + j] * c[j] + gates[j] * gates[3 * h_size + j])
                .collect();
            let h_new: Vec<f64> = (0..h_size)
                .map(|j| gates[2 * h_size + j] * self.activation.function(c_new[j]))
                .collect();

            output.data[t].copy_from_slice(&h_new);
            self.steps.push(StepCache {
                x,
                h_prev: h,
                c_prev: c,
                z,
                gates,
                c: c_new.clone(),
            });
            h = h_new;
            c = c_new;
        }

        output
    }

    /// Back-propagation through time for the sequence seen by the last
    /// `forward()`. Accumulates parameter gradients and returns ∂L/∂input.
    pub fn backward(&mut self, grad_output: &Matrix) -> Matrix {
        let h_size = self.n_out;
        assert_eq!(grad_output.rows, self.steps.len(), "gradient length does not match the cached sequence");
        assert_eq!(grad_output.cols, h_size);

        let mut grad_input = Matrix::zeros(self.steps.len(), self.n_in);
        let mut dh_next = vec![0.0; h_size];
        let mut dc_next = vec![0.0; h_size];

        for t in (0..self.steps.len()).rev() {
            let step = &self.steps[t];
            let mut dz = vec![0.0; 4 * h_size];
            let mut dc_prev = vec![0.0; h_size];

            for j in 0..h_size {
                let i = step.gates[j];
                let f = step.gates[h_size + j];
                let o = step.gates[2 * h_size + j];
                let g = step.gates[3 * h_size + j];

                let dh = grad_output.data[t][j] + dh_next[j];
                let dc = dh * o * self.activation.derivative(step.c[j]) + dc_next[j];

                dz[j] = dc * g * i * (1.0 - i);
                dz[h_size + j] = dc * step.c_prev[j] * f * (1.0 - f);
                dz[2 * h_size + j] = dh * self.activation.function(step.c[j]) * o * (1.0 - o);
                dz[3 * h_size + j] = dc * i * self.activation.derivative(step.z[3 * h_size + j]);
                dc_prev[j] = dc * f;
            }

            self.input_weights.grad.add_outer(&step.x, &dz);
            self.recurrent_weights.grad.add_outer(&step.h_prev, &dz);
            self.bias.grad.add_to_row(0, &dz);

            grad_input.data[t] = self.input_weights.value.mul_vec(&dz);
            dh_next = self.recurrent_weights.value.mul_vec(&dz);
            dc_next = dc_prev;
        }

        match &self.dropout_mask {
            Some(mask) => grad_input.hadamard(mask),
            None => grad_input,
        }
    }

    pub fn params(&self) -> Vec<&Param> {
        vec![&self.input_weights, &self.recurrent_weights, &self.bias]
    }

    pub fn params_mut(&mut self) -> Vec<&mut Param> {
        vec![&mut self.input_weights, &mut self.recurrent_weights, &mut self.bias]
    }
}

/// Inverted-dropout mask: kept entries are scaled by `1 / retain_prob`.
fn dropout_mask(rows: usize, cols: usize, retain_prob: f64, rng: &mut StdRng) -> Matrix {
    let mut mask = Matrix::zeros(rows, cols);
    for row in &mut mask.data {
        for cell in row.iter_mut() {
            if rng.gen::<f64>() < retain_prob {
                *cell = 1.0 / retain_prob;
            }
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn layer(n_in: usize, n_out: usize) -> LstmLayer {
        let mut rng = StdRng::seed_from_u64(42);
        LstmLayer::new(n_in, n_out, ActivationFunction::Tanh, None, WeightInit::Xavier, &mut rng)
    }

    fn sequence() -> Matrix {
        Matrix::from_data(vec![
            vec![0.5, -0.2, 0.1],
            vec![0.3, 0.8, -0.5],
            vec![-0.7, 0.1, 0.9],
            vec![0.2, 0.2, 0.2],
        ])
    }

    /// Loss used by the gradient checks: weighted sum of every output.
    fn weighted_sum(out: &Matrix) -> f64 {
        out.data.iter().enumerate()
            .flat_map(|(t, row)| row.iter().enumerate().map(move |(j, v)| v * (1.0 + 0.1 * (t + j) as f64)))
            .sum()
    }

    fn loss_weights(rows: usize, cols: usize) -> Matrix {
        let mut m = Matrix::zeros(rows, cols);
        for t in 0..rows {
            for j in 0..cols {
                m.data[t][j] = 1.0 + 0.1 * (t + j) as f64;
            }
        }
        m
    }

    #[test]
    fn output_has_one_row_per_time_step() {
        let mut lstm = layer(3, 5);
        let out = lstm.forward(&sequence(), None);
        assert_eq!((out.rows, out.cols), (4, 5));
        assert!(out.data.iter().flatten().all(|v| v.abs() < 1.0));
    }

    #[test]
    fn forget_gate_bias_starts_at_one() {
        let lstm = layer(3, 2);
        assert_eq!(lstm.bias.value.data[0], vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn analytic_gradients_match_finite_differences() {
        let input = sequence();
        let mut lstm = layer(3, 2);
        let out = lstm.forward(&input, None);
        for p in lstm.params_mut() {
            p.zero_grad();
        }
        let grad_input = lstm.backward(&loss_weights(out.rows, out.cols));

        let eps = 1e-6;
        for (p_idx, (r, c)) in [(0usize, (1usize, 3usize)), (1, (0, 6)), (2, (0, 2)), (0, (2, 7))] {
            let analytic = lstm.params()[p_idx].grad.data[r][c];
            let mut probe = lstm.clone();
            probe.params_mut()[p_idx].value.data[r][c] += eps;
            let plus = weighted_sum(&probe.forward(&input, None));
            probe.params_mut()[p_idx].value.data[r][c] -= 2.0 * eps;
            let minus = weighted_sum(&probe.forward(&input, None));
            let numeric = (plus - minus) / (2.0 * eps);
            assert!((analytic - numeric).abs() < 1e-6, "param {p_idx} [{r},{c}]: {analytic} vs {numeric}");
        }

        let mut shifted = input.clone();
        shifted.data[1][2] += eps;
        let plus = weighted_sum(&lstm.clone().forward(&shifted, None));
        shifted.data[1][2] -= 2.0 * eps;
        let minus = weighted_sum(&lstm.clone().forward(&shifted, None));
        let numeric = (plus - minus) / (2.0 * eps);
        assert!((grad_input.data[1][2] - numeric).abs() < 1e-6);
    }

    #[test]
    fn dropout_only_applies_with_rng() {
        let mut lstm = layer(3, 2);
        lstm.retain_prob = Some(0.5);
        let plain = lstm.forward(&sequence(), None);
        let again = lstm.forward(&sequence(), None);
        assert_eq!(plain, again);

        let mut rng = StdRng::seed_from_u64(1);
        let dropped = lstm.forward(&sequence(), Some(&mut rng));
        assert_ne!(plain, dropped);
    }
}
