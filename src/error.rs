use thiserror::Error;

/// Errors surfaced by data loading, configuration and preprocessing.
///
/// Shape mismatches inside `Matrix` arithmetic are programming errors and
/// panic instead of returning one of these.
#[derive(Error, Debug)]
pub enum SeqError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}, column '{column}': cannot parse '{value}'")]
    Parse {
        line: usize,
        column: String,
        value: String,
    },

    #[error("schema error: {0}")]
    Schema(String),

    #[error("invalid network configuration: {0}")]
    Config(String),

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("label {value} is not a class index in [0, {num_classes})")]
    InvalidLabel { value: f64, num_classes: usize },

    #[error("{0} has not been fitted")]
    NotFitted(&'static str),

    #[error("dataset is empty: {0}")]
    EmptyDataset(String),
}

pub type Result<T> = std::result::Result<T, SeqError>;
