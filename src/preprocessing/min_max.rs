use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::data::dataset::SequenceDataSet;
use crate::error::{Result, SeqError};
use crate::math::matrix::Matrix;

/// Scales each feature to `[0, 1]` using the minimum and maximum seen across
/// every time step of every fitted sample. A constant feature maps to `0`.
///
/// Only features are touched; labels pass through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    data_min: Option<Vec<f64>>,
    data_max: Option<Vec<f64>>,
}

const MIN_RANGE: f64 = 1e-10;

impl MinMaxScaler {
    pub fn new() -> MinMaxScaler {
        MinMaxScaler::default()
    }

    pub fn is_fitted(&self) -> bool {
        self.data_min.is_some()
    }

    pub fn data_min(&self) -> Option<&[f64]> {
        self.data_min.as_deref()
    }

    pub fn data_max(&self) -> Option<&[f64]> {
        self.data_max.as_deref()
    }

    pub fn fit(&mut self, dataset: &SequenceDataSet) -> Result<()> {
        let n_features = dataset.n_features();
        if dataset.is_empty() || n_features == 0 {
            return Err(SeqError::EmptyDataset("cannot fit a scaler without samples".into()));
        }

        let mut data_min = vec![f64::INFINITY; n_features];
        let mut data_max = vec![f64::NEG_INFINITY; n_features];
        for sample in &dataset.features {
            for row in &sample.data {
                for (j, &v) in row.iter().enumerate() {
                    data_min[j] = data_min[j].min(v);
                    data_max[j] = data_max[j].max(v);
                }
            }
        }

        self.data_min = Some(data_min);
        self.data_max = Some(data_max);
        Ok(())
    }

    /// Scales one sample's features.
    pub fn transform(&self, features: &Matrix) -> Result<Matrix> {
        let (min, max) = self.bounds(features.cols)?;
        Ok(Matrix::from_data(features.data.iter()
            .map(|row| row.iter().enumerate()
                .map(|(j, &v)| {
                    let range = max[j] - min[j];
                    if range.abs() > MIN_RANGE { (v - min[j]) / range } else { 0.0 }
                })
                .collect())
            .collect()))
    }

    /// Maps scaled features back to the original units.
    pub fn revert(&self, features: &Matrix) -> Result<Matrix> {
        let (min, max) = self.bounds(features.cols)?;
        Ok(Matrix::from_data(features.data.iter()
            .map(|row| row.iter().enumerate()
                .map(|(j, &v)| min[j] + v * (max[j] - min[j]))
                .collect())
            .collect()))
    }

    /// Scales every sample of `dataset` in place.
    pub fn transform_dataset(&self, dataset: &mut SequenceDataSet) -> Result<()> {
        for sample in dataset.features.iter_mut() {
            *sample = self.transform(sample)?;
        }
        Ok(())
    }

    fn bounds(&self, width: usize) -> Result<(&[f64], &[f64])> {
        let (Some(min), Some(max)) = (self.data_min.as_deref(), self.data_max.as_deref()) else {
            return Err(SeqError::NotFitted("MinMaxScaler"));
        };
        if width != min.len() {
            return Err(SeqError::Shape(format!(
                "scaler fitted on {} features, got {}",
                min.len(),
                width
            )));
        }
        Ok((min, max))
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<MinMaxScaler> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}
