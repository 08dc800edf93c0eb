use std::path::Path;

use rand::{rngs::StdRng, SeedableRng};
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::data::dataset::SequenceDataSet;
use crate::error::{Result, SeqError};
use crate::eval::evaluation::Evaluation;
use crate::eval::regression::RegressionEvaluation;
use crate::layers::{BidirectionalLstm, Layer, LstmLayer, Param, RnnOutputLayer};
use crate::loss::loss_type::LossType;
use crate::math::matrix::Matrix;
use crate::network::spec::{LayerSpec, NetworkConfig};
use crate::optim::optimizer::Optimizer;

/// A stack of recurrent layers ending in a time-distributed output layer.
///
/// Every sample is a `T x n_in` matrix; the output is `T x n_out`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub config: NetworkConfig,
    pub layers: Vec<Layer>,
    pub loss: LossType,
    /// Parameter updates applied so far; drives iteration-based schedules.
    pub iteration_count: usize,
    /// Completed epochs; drives epoch-based schedules.
    pub epoch_count: usize,
}

impl Network {
    /// Validates `config` and initialises every layer from `config.seed`.
    pub fn new(config: NetworkConfig) -> Result<Network> {
        let resolved = config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let init = config.weight_init;
        let mut loss = LossType::Mse;

        let layers = resolved.into_iter()
            .map(|(n_in, spec)| match spec {
                LayerSpec::Lstm { n_out, activation, retain_prob, .. } => {
                    Layer::Lstm(LstmLayer::new(n_in, n_out, activation, retain_prob, init, &mut rng))
                }
                LayerSpec::Bidirectional { n_out, activation, retain_prob, .. } => {
                    let fwd = LstmLayer::new(n_in, n_out, activation, retain_prob, init, &mut rng);
                    let bwd = LstmLayer::new(n_in, n_out, activation, retain_prob, init, &mut rng);
                    Layer::Bidirectional(BidirectionalLstm::new(fwd, bwd))
                }
                LayerSpec::RnnOutput { n_out, activation, loss: output_loss, .. } => {
                    loss = output_loss;
                    Layer::Output(RnnOutputLayer::new(n_in, n_out, activation, init, &mut rng))
                }
            })
            .collect::<Vec<_>>();

        let network = Network { config, layers, loss, iteration_count: 0, epoch_count: 0 };
        let kinds: Vec<&str> = network.layers.iter().map(Layer::kind).collect();
        debug!(layers = ?kinds, params = network.num_params(), "initialised network");
        Ok(network)
    }

    pub fn n_in(&self) -> usize {
        self.layers.first().map_or(0, Layer::n_in)
    }

    pub fn n_out(&self) -> usize {
        self.layers.last().map_or(0, Layer::n_out)
    }

    pub fn num_params(&self) -> usize {
        self.layers.iter()
            .flat_map(|layer| layer.params())
            .map(Param::len)
            .sum()
    }

    /// Inference on one sample; dropout is disabled.
    pub fn output(&mut self, input: &Matrix) -> Matrix {
        self.forward(input, None)
    }

    /// Forward pass; stores activations in each layer for backprop.
    fn forward(&mut self, input: &Matrix, mut rng: Option<&mut StdRng>) -> Matrix {
        let mut current = input.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current, rng.as_deref_mut());
        }
        current
    }

    fn backward(&mut self, grad_output: &Matrix) {
        let mut delta = grad_output.clone();
        for layer in self.layers.iter_mut().rev() {
            delta = layer.backward(&delta);
        }
    }

    pub fn params_mut(&mut self) -> Vec<&mut Param> {
        self.layers.iter_mut().flat_map(|layer| layer.params_mut()).collect()
    }

    /// `0.5 · l2 · Σ w²` over regularised parameters.
    pub fn l2_penalty(&self) -> f64 {
        if self.config.l2 == 0.0 {
            return 0.0;
        }
        let sum: f64 = self.layers.iter()
            .flat_map(|layer| layer.params())
            .filter(|p| p.regularize)
            .map(|p| p.value.sum_squares())
            .sum();
        0.5 * self.config.l2 * sum
    }

    /// Fills every parameter's gradient for one batch and returns its score.
    ///
    /// The score is the mean per-sample loss plus the L2 penalty. Gradients
    /// are averaged over the batch when `mini_batch` is set and summed
    /// otherwise; `l2 · w` is then added to regularised parameters.
    pub fn compute_gradients(
        &mut self,
        features: &[Matrix],
        labels: &[Matrix],
        mut rng: Option<&mut StdRng>,
    ) -> Result<f64> {
        check_batch(features, labels)?;
        for p in self.params_mut() {
            p.zero_grad();
        }

        let mut total_loss = 0.0;
        for (input, expected) in features.iter().zip(labels.iter()) {
            let output = self.forward(input, rng.as_deref_mut());
            if !output.same_shape(expected) {
                return Err(SeqError::Shape(format!(
                    "label is {}x{}, network produced {}x{}",
                    expected.rows, expected.cols, output.rows, output.cols
                )));
            }
            total_loss += self.loss.sequence_loss(&output, expected);
            let delta = self.loss.sequence_gradient(&output, expected);
            self.backward(&delta);
        }

        let n = features.len() as f64;
        let scale = if self.config.mini_batch { 1.0 / n } else { 1.0 };
        let l2 = self.config.l2;
        for p in self.params_mut() {
            if scale != 1.0 {
                p.grad = p.grad.scale(scale);
            }
            if p.regularize && l2 > 0.0 {
                p.grad.add_assign(&p.value.scale(l2));
            }
        }

        Ok(total_loss / n + self.l2_penalty())
    }

    /// One parameter update from a batch. Returns the batch score measured
    /// before the update.
    pub fn fit_batch(
        &mut self,
        features: &[Matrix],
        labels: &[Matrix],
        optimizer: &mut dyn Optimizer,
        rng: Option<&mut StdRng>,
    ) -> Result<f64> {
        let score = self.compute_gradients(features, labels, rng)?;
        let (iteration, epoch) = (self.iteration_count, self.epoch_count);
        let mut params = self.params_mut();
        optimizer.step(&mut params, iteration, epoch);
        self.iteration_count += 1;
        Ok(score)
    }

    /// Score of a batch without touching gradients or applying dropout.
    pub fn score(&mut self, features: &[Matrix], labels: &[Matrix]) -> Result<f64> {
        check_batch(features, labels)?;
        let mut total = 0.0;
        for (input, expected) in features.iter().zip(labels.iter()) {
            let output = self.output(input);
            total += self.loss.sequence_loss(&output, expected);
        }
        Ok(total / features.len() as f64 + self.l2_penalty())
    }

    /// Classification metrics over every time step of `dataset`.
    pub fn evaluate(&mut self, dataset: &SequenceDataSet) -> Evaluation {
        let mut eval = Evaluation::new(self.n_out());
        for (input, expected) in dataset.features.iter().zip(dataset.labels.iter()) {
            let output = self.output(input);
            eval.eval(expected, &output);
        }
        eval
    }

    /// Regression metrics over every time step and output of `dataset`.
    pub fn evaluate_regression(&mut self, dataset: &SequenceDataSet) -> RegressionEvaluation {
        let mut eval = RegressionEvaluation::new();
        for (input, expected) in dataset.features.iter().zip(dataset.labels.iter()) {
            let output = self.output(input);
            eval.eval(expected, &output);
        }
        eval
    }

    /// Serializes the network weights to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

fn check_batch(features: &[Matrix], labels: &[Matrix]) -> Result<()> {
    if features.is_empty() {
        return Err(SeqError::EmptyDataset("batch has no samples".into()));
    }
    if features.len() != labels.len() {
        return Err(SeqError::Shape(format!(
            "{} feature sequences but {} label sequences",
            features.len(),
            labels.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::optimizer::Updater;

    #[test]
    fn builds_layers_in_declared_order() {
        let config = NetworkConfig::builder()
            .layer(LayerSpec::bidirectional(2).n_in(3))
            .layer(LayerSpec::lstm(4))
            .layer(LayerSpec::rnn_output(1, LossType::Mse))
            .build();
        let net = Network::new(config).unwrap();
        let kinds: Vec<&str> = net.layers.iter().map(Layer::kind).collect();
        assert_eq!(kinds, vec!["bidirectional_lstm", "lstm", "rnn_output"]);
        assert_eq!((net.n_in(), net.n_out()), (3, 1));
    }

    fn tiny_classifier(l2: f64) -> Network {
        let config = NetworkConfig::builder()
            .seed(5)
            .l2(l2)
            .updater(Updater::adam(0.05))
            .layer(LayerSpec::lstm(3).n_in(2))
            .layer(LayerSpec::rnn_output(2, LossType::CrossEntropy))
            .build();
        Network::new(config).unwrap()
    }

    fn batch() -> (Vec<Matrix>, Vec<Matrix>) {
        let features = vec![
            Matrix::from_data(vec![vec![0.1, 0.9], vec![0.2, 0.8], vec![0.3, 0.7]]),
            Matrix::from_data(vec![vec![0.9, 0.1], vec![0.8, 0.3], vec![0.6, 0.2]]),
        ];
        let labels = vec![
            Matrix::from_data(vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![1.0, 0.0]]),
            Matrix::from_data(vec![vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0, 1.0]]),
        ];
        (features, labels)
    }

    #[test]
    fn same_seed_builds_identical_networks() {
        let a = tiny_classifier(0.0);
        let b = tiny_classifier(0.0);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
        // lstm: 2x12 + 3x12 + 12, output: 3x2 + 2
        assert_eq!(a.num_params(), 24 + 36 + 12 + 6 + 2);
    }

    #[test]
    fn gradients_match_finite_differences_of_score() {
        let (features, labels) = batch();
        let mut net = tiny_classifier(0.01);
        net.compute_gradients(&features, &labels, None).unwrap();
        let analytic: Vec<f64> = net.params_mut().iter().map(|p| p.grad.data[0][1]).collect();

        let eps = 1e-6;
        for (idx, expected) in analytic.iter().enumerate() {
            let mut probe = net.clone();
            probe.params_mut()[idx].value.data[0][1] += eps;
            let plus = probe.score(&features, &labels).unwrap();
            probe.params_mut()[idx].value.data[0][1] -= 2.0 * eps;
            let minus = probe.score(&features, &labels).unwrap();
            let numeric = (plus - minus) / (2.0 * eps);
            assert!((expected - numeric).abs() < 1e-6, "param {idx}: {expected} vs {numeric}");
        }
    }

    #[test]
    fn fitting_reduces_score_and_counts_iterations() {
        let (features, labels) = batch();
        let mut net = tiny_classifier(0.0);
        let mut optimizer = net.config.updater.build();
        let before = net.score(&features, &labels).unwrap();
        for _ in 0..50 {
            net.fit_batch(&features, &labels, optimizer.as_mut(), None).unwrap();
        }
        let after = net.score(&features, &labels).unwrap();
        assert!(after < before, "{after} >= {before}");
        assert_eq!(net.iteration_count, 50);
    }

    #[test]
    fn rejects_mismatched_labels() {
        let (features, _) = batch();
        let mut net = tiny_classifier(0.0);
        let wrong = vec![Matrix::zeros(3, 5), Matrix::zeros(3, 5)];
        assert!(matches!(net.compute_gradients(&features, &wrong, None), Err(SeqError::Shape(_))));
        assert!(matches!(net.score(&[], &[]), Err(SeqError::EmptyDataset(_))));
    }

    #[test]
    fn saved_network_predicts_identically() {
        let mut net = tiny_classifier(0.0);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        net.save_json(&path).unwrap();
        let mut loaded = Network::load_json(&path).unwrap();
        let (features, _) = batch();
        assert_eq!(net.output(&features[0]), loaded.output(&features[0]));
    }
}
