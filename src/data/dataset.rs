use crate::error::{Result, SeqError};
use crate::math::matrix::Matrix;

/// Paired feature and label sequences. Sample `i` is `features[i]`
/// (`T x n_features`) with labels `labels[i]` (`T x n_outputs`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceDataSet {
    pub features: Vec<Matrix>,
    pub labels: Vec<Matrix>,
}

impl SequenceDataSet {
    /// Checks that samples pair up, share widths and align in time.
    pub fn new(features: Vec<Matrix>, labels: Vec<Matrix>) -> Result<SequenceDataSet> {
        if features.len() != labels.len() {
            return Err(SeqError::Shape(format!(
                "{} feature sequences but {} label sequences",
                features.len(),
                labels.len()
            )));
        }
        if let (Some(f0), Some(l0)) = (features.first(), labels.first()) {
            for (i, (f, l)) in features.iter().zip(labels.iter()).enumerate() {
                if f.cols != f0.cols || l.cols != l0.cols {
                    return Err(SeqError::Shape(format!("sample {i}: width differs from sample 0")));
                }
                if f.rows != l.rows {
                    return Err(SeqError::Shape(format!(
                        "sample {i}: {} feature steps but {} label steps",
                        f.rows, l.rows
                    )));
                }
            }
        }
        Ok(SequenceDataSet { features, labels })
    }

    /// Splits windows of raw rows into features and one-hot labels.
    ///
    /// Column `label_index` holds a class index in `[0, num_classes)`; every
    /// other column becomes a feature, in order.
    pub fn from_windows(windows: &[Vec<Vec<f64>>], label_index: usize, num_classes: usize) -> Result<SequenceDataSet> {
        let mut features = Vec::with_capacity(windows.len());
        let mut labels = Vec::with_capacity(windows.len());

        for window in windows {
            let mut f_rows = Vec::with_capacity(window.len());
            let mut l_rows = Vec::with_capacity(window.len());
            for row in window {
                if label_index >= row.len() {
                    return Err(SeqError::Schema(format!(
                        "label index {label_index} out of range for {} columns",
                        row.len()
                    )));
                }
                let value = row[label_index];
                if value.fract() != 0.0 || value < 0.0 || value as usize >= num_classes {
                    return Err(SeqError::InvalidLabel { value, num_classes });
                }
                let mut one_hot = vec![0.0; num_classes];
                one_hot[value as usize] = 1.0;

                f_rows.push(row.iter().enumerate()
                    .filter(|&(j, _)| j != label_index)
                    .map(|(_, &v)| v)
                    .collect());
                l_rows.push(one_hot);
            }
            features.push(Matrix::from_data(f_rows));
            labels.push(Matrix::from_data(l_rows));
        }

        SequenceDataSet::new(features, labels)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.features.first().map_or(0, |f| f.cols)
    }

    pub fn n_outputs(&self) -> usize {
        self.labels.first().map_or(0, |l| l.cols)
    }

    /// Consecutive batches of at most `batch_size` samples.
    pub fn batches(&self, batch_size: usize) -> impl Iterator<Item = (&[Matrix], &[Matrix])> {
        let size = batch_size.max(1);
        self.features.chunks(size).zip(self.labels.chunks(size))
    }

    /// Clones the samples at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> (Vec<Matrix>, Vec<Matrix>) {
        indices.iter()
            .map(|&i| (self.features[i].clone(), self.labels[i].clone()))
            .unzip()
    }
}
