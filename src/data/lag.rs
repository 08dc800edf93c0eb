use crate::data::dataset::SequenceDataSet;
use crate::math::matrix::Matrix;

/// Lag features for univariate forecasting: each run of `lag` consecutive
/// values is paired with the value that immediately follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct LaggedSeries {
    lag: usize,
    features: Vec<Vec<f64>>,
    labels: Vec<f64>,
}

impl LaggedSeries {
    /// `series.len() - lag` pairs; none when `lag == 0` or `lag >= series.len()`.
    pub fn new(series: &[f64], lag: usize) -> LaggedSeries {
        let count = if lag == 0 { 0 } else { series.len().saturating_sub(lag) };
        let features = (0..count).map(|i| series[i..i + lag].to_vec()).collect();
        let labels = (0..count).map(|i| series[i + lag]).collect();
        LaggedSeries { lag, features, labels }
    }

    pub fn lag(&self) -> usize {
        self.lag
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&[f64], f64)> {
        self.features.iter().map(Vec::as_slice).zip(self.labels.iter().copied())
    }

    /// One sample per pair: a single time step carrying the `lag` values as
    /// features, labelled with the next value.
    pub fn to_dataset(&self) -> SequenceDataSet {
        SequenceDataSet {
            features: self.features.iter().map(|f| expand_dims(f)).collect(),
            labels: self.labels.iter().map(|&y| Matrix::row_vector(vec![y])).collect(),
        }
    }
}

/// Shapes raw lag values as a one-step sequence sample (`1 x values.len()`).
pub fn expand_dims(values: &[f64]) -> Matrix {
    Matrix::row_vector(values.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> Vec<f64> {
        (1..=9).map(|i| (i * 10) as f64).collect()
    }

    #[test]
    fn pairs_each_window_with_the_next_value() {
        let lagged = LaggedSeries::new(&series(), 3);
        let pairs: Vec<(Vec<f64>, f64)> = lagged.pairs().map(|(f, y)| (f.to_vec(), y)).collect();
        assert_eq!(pairs.len(), 6);
        assert_eq!(pairs[0], (vec![10.0, 20.0, 30.0], 40.0));
        assert_eq!(pairs[1], (vec![20.0, 30.0, 40.0], 50.0));
        assert_eq!(pairs[5], (vec![60.0, 70.0, 80.0], 90.0));
    }

    #[test]
    fn degenerate_lags_produce_no_pairs() {
        assert!(LaggedSeries::new(&series(), 0).is_empty());
        assert!(LaggedSeries::new(&series(), 9).is_empty());
        assert!(LaggedSeries::new(&series(), 12).is_empty());
        assert_eq!(LaggedSeries::new(&series(), 8).len(), 1);
    }

    #[test]
    fn dataset_samples_are_single_time_steps() {
        let ds = LaggedSeries::new(&series(), 3).to_dataset();
        assert_eq!(ds.len(), 6);
        assert_eq!((ds.features[0].rows, ds.features[0].cols), (1, 3));
        assert_eq!(ds.labels[2].data, vec![vec![60.0]]);
        assert_eq!(expand_dims(&[50.0, 60.0, 70.0]).data, vec![vec![50.0, 60.0, 70.0]]);
    }
}
