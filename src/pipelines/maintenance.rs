use std::path::{Path, PathBuf};

use rand::{rngs::StdRng, SeedableRng};
use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::activation::activation::ActivationFunction;
use crate::data::csv_reader::CsvRecordReader;
use crate::data::dataset::SequenceDataSet;
use crate::data::schema::Schema;
use crate::data::transform::TransformProcess;
use crate::data::window::window_sequences;
use crate::error::{Result, SeqError};
use crate::eval::evaluation::Evaluation;
use crate::layers::init::WeightInit;
use crate::loss::loss_type::LossType;
use crate::network::metadata::ModelMetadata;
use crate::network::network::Network;
use crate::network::spec::{LayerSpec, NetworkConfig};
use crate::optim::optimizer::Updater;
use crate::optim::schedule::{CycleSchedule, LearningRate, ScheduleType};
use crate::preprocessing::min_max::MinMaxScaler;
use crate::train::listener::{ScoreIterationListener, TrainingListener};
use crate::train::train_config::TrainConfig;
use crate::train::trainer::fit_epoch;

/// Integer columns of the turbofan sensor files, in file order.
pub const INTEGER_COLUMNS: &[&str] = &["id", "cycle"];

/// Real-valued columns, in file order after `INTEGER_COLUMNS`.
pub const DOUBLE_COLUMNS: &[&str] = &[
    "setting1", "setting2", "setting3",
    "s1", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10",
    "s11", "s12", "s13", "s14", "s15", "s16", "s17", "s18", "s19", "s20", "s21",
    "cycle_norm",
];

/// Trailing integer columns: remaining useful life and the two labels.
pub const LABEL_COLUMNS: &[&str] = &["RUL", "label1", "label2"];

/// Columns dropped before training.
pub const REMOVED_COLUMNS: &[&str] = &[
    "setting3", "s1", "s5", "s10", "s16", "s18", "s19", "RUL", "label2",
];

/// Settings of the predictive-maintenance classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    /// Header lines skipped in each CSV file.
    pub skip_lines: usize,
    pub sequence_length: usize,
    pub batch_size: usize,
    pub num_classes: usize,
    pub label_column: String,
    pub epochs: usize,
    pub seed: u64,
    pub l2: f64,
    pub lstm_sizes: Vec<usize>,
    pub retain_prob: f64,
    pub initial_lr: f64,
    pub max_lr: f64,
    pub annealing_decay: f64,
    /// Log the score every this many iterations.
    pub score_frequency: usize,
    pub save_model: Option<PathBuf>,
    pub save_scaler: Option<PathBuf>,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        MaintenanceConfig {
            train_path: PathBuf::from("data/predictive_maintenance/train.csv"),
            test_path: PathBuf::from("data/predictive_maintenance/test.csv"),
            skip_lines: 1,
            sequence_length: 30,
            batch_size: 200,
            num_classes: 2,
            label_column: "label1".to_string(),
            epochs: 75,
            seed: 123,
            l2: 1e-5,
            lstm_sizes: vec![100, 50],
            retain_prob: 0.9,
            initial_lr: 1e-5,
            max_lr: 1e-2,
            annealing_decay: 0.1,
            score_frequency: 10,
            save_model: None,
            save_scaler: None,
        }
    }
}

impl MaintenanceConfig {
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<MaintenanceConfig> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

/// What a maintenance run produced.
#[derive(Debug, Clone)]
pub struct MaintenanceReport {
    pub train_windows: usize,
    pub test_windows: usize,
    pub epochs_run: usize,
    /// Mean training score of the final epoch.
    pub final_score: f64,
    /// Test-set evaluation after the final epoch.
    pub evaluation: Evaluation,
    pub network: Network,
    pub scaler: MinMaxScaler,
}

/// Raw schema of the sensor CSV files.
pub fn sensor_schema() -> Result<Schema> {
    Schema::builder()
        .add_columns_integer(INTEGER_COLUMNS)
        .add_columns_double(DOUBLE_COLUMNS)
        .add_columns_integer(LABEL_COLUMNS)
        .build()
}

/// Drops unused columns and groups rows into one sequence per engine `id`,
/// ordered by `cycle`.
pub fn sensor_transform() -> Result<TransformProcess> {
    TransformProcess::builder(sensor_schema()?)
        .remove_columns(REMOVED_COLUMNS)
        .convert_to_sequence("id", "cycle")
        .build()
}

/// Reads one CSV file and turns it into windowed, one-hot labelled samples.
pub fn load_windows(
    path: &Path,
    transform: &TransformProcess,
    config: &MaintenanceConfig,
) -> Result<SequenceDataSet> {
    debug!(steps = ?transform.steps(), "transforming {}", path.display());
    let reader = CsvRecordReader::new(config.skip_lines, b',');
    let records = reader.read_path(path)?;
    let rows = transform.initial_schema().parse_records(&records)?;
    let sequences = transform.execute_to_sequence(&rows)?;
    let windows = window_sequences(&sequences, config.sequence_length);

    info!(
        path = %path.display(),
        rows = rows.len(),
        engines = sequences.len(),
        windows = windows.len(),
        "loaded sensor data"
    );

    if windows.is_empty() {
        return Err(SeqError::EmptyDataset(format!(
            "{}: no engine has more than {} cycles",
            path.display(),
            config.sequence_length
        )));
    }

    let label_index = transform.final_schema().index_of(&config.label_column)?;
    SequenceDataSet::from_windows(&windows, label_index, config.num_classes)
}

/// Two stacked LSTMs with input dropout, then a per-step softmax.
pub fn network_config(config: &MaintenanceConfig, n_features: usize, feature_names: Vec<String>) -> Result<NetworkConfig> {
    let annealing = (config.epochs as f64 * 0.1).round() as usize;
    let schedule = CycleSchedule::new(
        ScheduleType::Epoch,
        config.initial_lr,
        config.max_lr,
        config.epochs,
        annealing,
        config.annealing_decay,
    )?;

    let mut builder = NetworkConfig::builder()
        .seed(config.seed)
        .l2(config.l2)
        .weight_init(WeightInit::Xavier)
        .updater(Updater::adam(LearningRate::Cycle(schedule)))
        .metadata(ModelMetadata {
            description: Some("predictive maintenance LSTM classifier".to_string()),
            feature_names: Some(feature_names),
            output_labels: Some((0..config.num_classes).map(|c| c.to_string()).collect()),
        });

    for (i, &size) in config.lstm_sizes.iter().enumerate() {
        let mut layer = LayerSpec::lstm(size)
            .activation(ActivationFunction::Tanh)
            .retain_prob(config.retain_prob);
        if i == 0 {
            layer = layer.n_in(n_features);
        }
        builder = builder.layer(layer);
    }

    let mut output = LayerSpec::rnn_output(config.num_classes, LossType::CrossEntropy);
    if config.lstm_sizes.is_empty() {
        output = output.n_in(n_features);
    }
    Ok(builder.layer(output).build())
}

/// Loads, scales, trains and evaluates the classifier, logging the test-set
/// statistics after every epoch.
pub fn run(config: &MaintenanceConfig) -> Result<MaintenanceReport> {
    let transform = sensor_transform()?;
    let mut train = load_windows(&config.train_path, &transform, config)?;
    let mut test = load_windows(&config.test_path, &transform, config)?;

    let mut scaler = MinMaxScaler::new();
    scaler.fit(&train)?;
    scaler.transform_dataset(&mut train)?;
    scaler.transform_dataset(&mut test)?;

    let label_index = transform.final_schema().index_of(&config.label_column)?;
    let feature_names: Vec<String> = transform.final_schema()
        .names()
        .into_iter()
        .enumerate()
        .filter(|&(i, _)| i != label_index)
        .map(|(_, name)| name)
        .collect();

    let mut network = Network::new(network_config(config, train.n_features(), feature_names)?)?;
    info!(params = network.num_params(), "built network");

    let mut optimizer = network.config.updater.build();
    let train_config = TrainConfig::new(config.epochs, config.batch_size).with_seed(config.seed);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut score_listener = ScoreIterationListener::new(config.score_frequency);

    let mut final_score = 0.0;
    let mut evaluation = Evaluation::new(config.num_classes);

    for epoch in 0..config.epochs {
        let listeners: &mut [&mut dyn TrainingListener] = &mut [&mut score_listener];
        final_score = fit_epoch(&mut network, &train, optimizer.as_mut(), &train_config, listeners, &mut rng)?;

        evaluation = network.evaluate(&test);
        info!("EPOCH: {epoch}");
        info!("\n{}", evaluation.stats());
    }

    if let Some(path) = &config.save_model {
        network.save_json(path)?;
        info!(path = %path.display(), "saved network");
    }
    if let Some(path) = &config.save_scaler {
        scaler.save_json(path)?;
        info!(path = %path.display(), "saved scaler");
    }

    Ok(MaintenanceReport {
        train_windows: train.len(),
        test_windows: test.len(),
        epochs_run: network.epoch_count,
        final_score,
        evaluation,
        network,
        scaler,
    })
}
