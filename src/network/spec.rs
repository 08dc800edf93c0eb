use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Result, SeqError};
use crate::layers::init::WeightInit;
use crate::loss::loss_type::LossType;
use crate::network::metadata::ModelMetadata;
use crate::optim::optimizer::Updater;

/// Describes one layer in a network configuration.
///
/// `n_in` is only required on the first layer; later layers take the output
/// size of the layer before them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Lstm {
        n_in: Option<usize>,
        n_out: usize,
        activation: ActivationFunction,
        /// Input retain probability during training; `None` disables dropout.
        retain_prob: Option<f64>,
    },
    /// Forward and backward LSTM of `n_out` units each; emits `2 · n_out`.
    Bidirectional {
        n_in: Option<usize>,
        n_out: usize,
        activation: ActivationFunction,
        retain_prob: Option<f64>,
    },
    RnnOutput {
        n_in: Option<usize>,
        n_out: usize,
        activation: ActivationFunction,
        loss: LossType,
    },
}

impl LayerSpec {
    pub fn lstm(n_out: usize) -> LayerSpec {
        LayerSpec::Lstm { n_in: None, n_out, activation: ActivationFunction::Tanh, retain_prob: None }
    }

    pub fn bidirectional(n_out: usize) -> LayerSpec {
        LayerSpec::Bidirectional { n_in: None, n_out, activation: ActivationFunction::Tanh, retain_prob: None }
    }

    /// Output layer with the activation that matches `loss`
    /// (Softmax for cross-entropy, Identity for MSE).
    pub fn rnn_output(n_out: usize, loss: LossType) -> LayerSpec {
        let activation = match loss {
            LossType::CrossEntropy => ActivationFunction::Softmax,
            LossType::Mse => ActivationFunction::Identity,
        };
        LayerSpec::RnnOutput { n_in: None, n_out, activation, loss }
    }

    pub fn n_in(mut self, value: usize) -> LayerSpec {
        match &mut self {
            LayerSpec::Lstm { n_in, .. }
            | LayerSpec::Bidirectional { n_in, .. }
            | LayerSpec::RnnOutput { n_in, .. } => *n_in = Some(value),
        }
        self
    }

    pub fn activation(mut self, value: ActivationFunction) -> LayerSpec {
        match &mut self {
            LayerSpec::Lstm { activation, .. }
            | LayerSpec::Bidirectional { activation, .. }
            | LayerSpec::RnnOutput { activation, .. } => *activation = value,
        }
        self
    }

    /// Sets the dropout retain probability; ignored on output layers.
    pub fn retain_prob(mut self, value: f64) -> LayerSpec {
        match &mut self {
            LayerSpec::Lstm { retain_prob, .. }
            | LayerSpec::Bidirectional { retain_prob, .. } => *retain_prob = Some(value),
            LayerSpec::RnnOutput { .. } => {}
        }
        self
    }

    pub fn declared_n_in(&self) -> Option<usize> {
        match self {
            LayerSpec::Lstm { n_in, .. }
            | LayerSpec::Bidirectional { n_in, .. }
            | LayerSpec::RnnOutput { n_in, .. } => *n_in,
        }
    }

    /// Width of this layer's output.
    pub fn output_size(&self) -> usize {
        match self {
            LayerSpec::Lstm { n_out, .. } | LayerSpec::RnnOutput { n_out, .. } => *n_out,
            LayerSpec::Bidirectional { n_out, .. } => 2 * n_out,
        }
    }

    pub fn is_output(&self) -> bool {
        matches!(self, LayerSpec::RnnOutput { .. })
    }
}

/// A fully serializable description of a sequence network: global training
/// settings plus the ordered layer list.
///
/// Built with `NetworkConfig::builder()`; `NetworkConfig::validate()` is
/// called by `Network::new()` and resolves every layer's input size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub seed: u64,
    /// L2 coefficient applied to weights (not biases).
    pub l2: f64,
    pub weight_init: WeightInit,
    pub updater: Updater,
    /// When true, accumulated gradients are averaged over the batch.
    pub mini_batch: bool,
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl NetworkConfig {
    pub fn builder() -> NetworkConfigBuilder {
        NetworkConfigBuilder::default()
    }

    /// Checks layer ordering and sizes; returns `(n_in, spec)` per layer.
    pub fn validate(&self) -> Result<Vec<(usize, LayerSpec)>> {
        let Some(last) = self.layers.last() else {
            return Err(SeqError::Config("network has no layers".into()));
        };
        if !last.is_output() {
            return Err(SeqError::Config("last layer must be an RNN output layer".into()));
        }
        if self.l2 < 0.0 {
            return Err(SeqError::Config(format!("l2 must be non-negative, got {}", self.l2)));
        }

        let mut resolved = Vec::with_capacity(self.layers.len());
        let mut prev_out: Option<usize> = None;

        for (idx, spec) in self.layers.iter().enumerate() {
            if spec.is_output() && idx + 1 != self.layers.len() {
                return Err(SeqError::Config(format!("layer {idx}: output layer must be last")));
            }

            let n_in = match (spec.declared_n_in(), prev_out) {
                (Some(declared), Some(prev)) if declared != prev => {
                    return Err(SeqError::Config(format!(
                        "layer {idx}: n_in {declared} does not match previous layer output {prev}"
                    )));
                }
                (Some(declared), _) => declared,
                (None, Some(prev)) => prev,
                (None, None) => {
                    return Err(SeqError::Config("first layer must declare n_in".into()));
                }
            };

            if n_in == 0 || spec.output_size() == 0 {
                return Err(SeqError::Config(format!("layer {idx}: sizes must be positive")));
            }

            match spec {
                LayerSpec::Lstm { activation: ActivationFunction::Softmax, .. }
                | LayerSpec::Bidirectional { activation: ActivationFunction::Softmax, .. } => {
                    return Err(SeqError::Config(format!(
                        "layer {idx}: softmax is only supported on the output layer"
                    )));
                }
                LayerSpec::Lstm { retain_prob: Some(p), .. }
                | LayerSpec::Bidirectional { retain_prob: Some(p), .. }
                    if !(*p > 0.0 && *p <= 1.0) =>
                {
                    return Err(SeqError::Config(format!(
                        "layer {idx}: retain probability {p} outside (0, 1]"
                    )));
                }
                LayerSpec::RnnOutput { activation, loss, .. } => {
                    let softmax = *activation == ActivationFunction::Softmax;
                    if softmax != (*loss == LossType::CrossEntropy) {
                        return Err(SeqError::Config(format!(
                            "layer {idx}: cross-entropy must be paired with a softmax output"
                        )));
                    }
                }
                _ => {}
            }

            resolved.push((n_in, spec.clone()));
            prev_out = Some(spec.output_size());
        }

        Ok(resolved)
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkConfig` from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<NetworkConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Builder mirroring the order settings are usually declared in:
/// global options first, then layers.
#[derive(Debug, Clone)]
pub struct NetworkConfigBuilder {
    seed: u64,
    l2: f64,
    weight_init: WeightInit,
    updater: Updater,
    mini_batch: bool,
    layers: Vec<LayerSpec>,
    metadata: Option<ModelMetadata>,
}

impl Default for NetworkConfigBuilder {
    fn default() -> Self {
        NetworkConfigBuilder {
            seed: 0,
            l2: 0.0,
            weight_init: WeightInit::Xavier,
            updater: Updater::sgd(0.1),
            mini_batch: true,
            layers: Vec::new(),
            metadata: None,
        }
    }
}

impl NetworkConfigBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn l2(mut self, l2: f64) -> Self {
        self.l2 = l2;
        self
    }

    pub fn weight_init(mut self, weight_init: WeightInit) -> Self {
        self.weight_init = weight_init;
        self
    }

    pub fn updater(mut self, updater: Updater) -> Self {
        self.updater = updater;
        self
    }

    pub fn mini_batch(mut self, mini_batch: bool) -> Self {
        self.mini_batch = mini_batch;
        self
    }

    pub fn layer(mut self, layer: LayerSpec) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn metadata(mut self, metadata: ModelMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn build(self) -> NetworkConfig {
        NetworkConfig {
            seed: self.seed,
            l2: self.l2,
            weight_init: self.weight_init,
            updater: self.updater,
            mini_batch: self.mini_batch,
            layers: self.layers,
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_layer() -> NetworkConfigBuilder {
        NetworkConfig::builder()
            .seed(123)
            .layer(LayerSpec::lstm(8).n_in(4))
            .layer(LayerSpec::rnn_output(2, LossType::CrossEntropy))
    }

    #[test]
    fn input_sizes_are_inferred_from_previous_layer() {
        let config = NetworkConfig::builder()
            .layer(LayerSpec::bidirectional(5).n_in(3))
            .layer(LayerSpec::lstm(4))
            .layer(LayerSpec::rnn_output(1, LossType::Mse))
            .build();
        let sizes: Vec<usize> = config.validate().unwrap().iter().map(|(n_in, _)| *n_in).collect();
        assert_eq!(sizes, vec![3, 10, 4]);
    }

    #[test]
    fn rejects_missing_output_layer_and_first_n_in() {
        let no_output = NetworkConfig::builder().layer(LayerSpec::lstm(3).n_in(2)).build();
        assert!(matches!(no_output.validate(), Err(SeqError::Config(_))));

        let no_n_in = NetworkConfig::builder()
            .layer(LayerSpec::lstm(3))
            .layer(LayerSpec::rnn_output(1, LossType::Mse))
            .build();
        assert!(no_n_in.validate().is_err());
    }

    #[test]
    fn rejects_conflicting_n_in_and_bad_retain_prob() {
        let conflicting = NetworkConfig::builder()
            .layer(LayerSpec::lstm(3).n_in(2))
            .layer(LayerSpec::rnn_output(1, LossType::Mse).n_in(7))
            .build();
        assert!(conflicting.validate().is_err());

        let dropout = NetworkConfig::builder()
            .layer(LayerSpec::lstm(3).n_in(2).retain_prob(1.5))
            .layer(LayerSpec::rnn_output(1, LossType::Mse))
            .build();
        assert!(dropout.validate().is_err());
    }

    #[test]
    fn rejects_cross_entropy_without_softmax() {
        let config = NetworkConfig::builder()
            .layer(LayerSpec::lstm(3).n_in(2))
            .layer(LayerSpec::rnn_output(2, LossType::CrossEntropy).activation(ActivationFunction::Identity))
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_softmax_on_recurrent_layers() {
        for hidden in [LayerSpec::lstm(3), LayerSpec::bidirectional(3)] {
            let config = NetworkConfig::builder()
                .layer(hidden.n_in(2).activation(ActivationFunction::Softmax))
                .layer(LayerSpec::rnn_output(1, LossType::Mse))
                .build();
            assert!(matches!(config.validate(), Err(SeqError::Config(_))));
        }
    }

    #[test]
    fn loading_rejects_invalid_learning_rate_schedule() {
        let schedule = crate::optim::schedule::CycleSchedule::new(
            crate::optim::schedule::ScheduleType::Epoch, 1e-5, 1e-2, 10, 1, 0.1,
        ).unwrap();
        let config = two_layer()
            .updater(Updater::adam(crate::optim::schedule::LearningRate::Cycle(schedule)))
            .build();
        let mut json = serde_json::to_value(&config).unwrap();
        json["updater"]["learning_rate"]["cycle"]["cycle_length"] = serde_json::json!(0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, json.to_string()).unwrap();
        assert!(matches!(NetworkConfig::load_json(&path), Err(SeqError::Json(_))));
    }

    #[test]
    fn json_round_trip_preserves_config() {
        let config = two_layer().l2(1e-5).updater(Updater::adam(0.01)).build();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        config.save_json(&path).unwrap();
        assert_eq!(NetworkConfig::load_json(&path).unwrap(), config);
    }
}
