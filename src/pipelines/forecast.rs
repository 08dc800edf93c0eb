use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::activation::activation::ActivationFunction;
use crate::data::lag::{expand_dims, LaggedSeries};
use crate::error::{Result, SeqError};
use crate::eval::regression::RegressionEvaluation;
use crate::layers::init::WeightInit;
use crate::loss::loss_type::LossType;
use crate::network::network::Network;
use crate::network::spec::{LayerSpec, NetworkConfig};
use crate::optim::optimizer::Updater;
use crate::train::listener::{ScoreIterationListener, TrainingListener};
use crate::train::loop_fn::train_loop;
use crate::train::train_config::TrainConfig;

/// Settings of the univariate bidirectional-LSTM forecaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub series: Vec<f64>,
    pub lag: usize,
    pub hidden_size: usize,
    pub learning_rate: f64,
    /// Full-batch updates; one per epoch.
    pub iterations: usize,
    pub seed: u64,
    pub score_frequency: usize,
    /// Windows of `lag` values to predict the next value for after training.
    pub test_inputs: Vec<Vec<f64>>,
    pub save_model: Option<PathBuf>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            series: (1..=9).map(|i| (i * 10) as f64).collect(),
            lag: 3,
            hidden_size: 50,
            learning_rate: 0.001,
            iterations: 10_000,
            seed: 123,
            score_frequency: 1_000,
            test_inputs: vec![
                vec![10.0, 20.0, 30.0],
                vec![20.0, 30.0, 40.0],
                vec![50.0, 60.0, 70.0],
            ],
            save_model: None,
        }
    }
}

impl ForecastConfig {
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<ForecastConfig> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

/// One forecast: the input window and the predicted next value.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub input: Vec<f64>,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct ForecastReport {
    pub predictions: Vec<Prediction>,
    /// Fit over the training pairs after the last iteration.
    pub evaluation: RegressionEvaluation,
    pub final_score: f64,
    pub network: Network,
}

/// Bidirectional LSTM over one time step of `lag` features, identity output.
pub fn network_config(config: &ForecastConfig) -> NetworkConfig {
    NetworkConfig::builder()
        .seed(config.seed)
        .weight_init(WeightInit::Xavier)
        .updater(Updater::rms_prop(config.learning_rate))
        .mini_batch(false)
        .layer(LayerSpec::bidirectional(config.hidden_size)
            .n_in(config.lag)
            .activation(ActivationFunction::Tanh))
        .layer(LayerSpec::rnn_output(1, LossType::Mse))
        .build()
}

/// Predicts the value following `window` (which must hold `lag` values).
pub fn predict(network: &mut Network, window: &[f64]) -> Result<f64> {
    if window.len() != network.n_in() {
        return Err(SeqError::Shape(format!(
            "forecast input has {} values, network expects {}",
            window.len(),
            network.n_in()
        )));
    }
    let output = network.output(&expand_dims(window));
    Ok(output.data[0][0])
}

/// Trains the forecaster on the lagged series and predicts every test input.
pub fn run(config: &ForecastConfig) -> Result<ForecastReport> {
    let lagged = LaggedSeries::new(&config.series, config.lag);
    if lagged.is_empty() {
        return Err(SeqError::EmptyDataset(format!(
            "series of {} values yields no pairs with lag {}",
            config.series.len(),
            config.lag
        )));
    }
    if let Some(bad) = config.test_inputs.iter().find(|w| w.len() != config.lag) {
        return Err(SeqError::Config(format!(
            "test input {bad:?} has {} values but lag is {}",
            bad.len(),
            config.lag
        )));
    }
    for (input, target) in lagged.pairs() {
        info!("{input:?} -> {target}");
    }
    let dataset = lagged.to_dataset();

    let mut network = Network::new(network_config(config))?;
    let mut optimizer = network.config.updater.build();
    let train_config = TrainConfig::new(config.iterations, dataset.len()).with_seed(config.seed);
    let mut score_listener = ScoreIterationListener::new(config.score_frequency);
    let listeners: &mut [&mut dyn TrainingListener] = &mut [&mut score_listener];

    let final_score = train_loop(&mut network, &dataset, None, optimizer.as_mut(), &train_config, listeners)?;
    let evaluation = network.evaluate_regression(&dataset);
    info!(final_score, rmse = evaluation.root_mean_squared_error(), "training finished");

    let mut predictions = Vec::with_capacity(config.test_inputs.len());
    for input in &config.test_inputs {
        let value = predict(&mut network, input)?;
        info!("{input:?} -> {value}");
        predictions.push(Prediction { input: input.clone(), value });
    }

    if let Some(path) = &config.save_model {
        network.save_json(path)?;
        info!(path = %path.display(), "saved network");
    }

    Ok(ForecastReport { predictions, evaluation, final_score, network })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_network_takes_lag_features_and_emits_one_value() {
        let config = ForecastConfig::default();
        let network = Network::new(network_config(&config)).unwrap();
        assert_eq!(network.n_in(), 3);
        assert_eq!(network.n_out(), 1);
        assert!(!network.config.mini_batch);
    }

    #[test]
    fn predict_rejects_wrong_window_length() {
        let mut network = Network::new(network_config(&ForecastConfig::default())).unwrap();
        assert!(matches!(predict(&mut network, &[1.0, 2.0]), Err(SeqError::Shape(_))));
    }

    #[test]
    fn test_inputs_must_match_lag_before_training() {
        let config = ForecastConfig { lag: 4, iterations: 200, ..ForecastConfig::default() };
        let err = run(&config).unwrap_err();
        assert!(matches!(err, SeqError::Config(ref msg) if msg.contains("lag is 4")));
    }

    #[test]
    fn lag_not_shorter_than_series_is_an_error() {
        let config = ForecastConfig { lag: 9, iterations: 1, ..ForecastConfig::default() };
        assert!(matches!(run(&config), Err(SeqError::EmptyDataset(_))));
    }
}
