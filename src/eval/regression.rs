use crate::math::matrix::Matrix;

/// Running regression metrics over every time step and output column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegressionEvaluation {
    count: usize,
    sum_sq_error: f64,
    sum_abs_error: f64,
    sum_labels: f64,
    sum_sq_labels: f64,
}

impl RegressionEvaluation {
    pub fn new() -> RegressionEvaluation {
        RegressionEvaluation::default()
    }

    pub fn eval(&mut self, labels: &Matrix, predictions: &Matrix) {
        assert!(labels.same_shape(predictions), "labels and predictions differ in shape");
        for (l_row, p_row) in labels.data.iter().zip(predictions.data.iter()) {
            for (&y, &p) in l_row.iter().zip(p_row.iter()) {
                let err = p - y;
                self.count += 1;
                self.sum_sq_error += err * err;
                self.sum_abs_error += err.abs();
                self.sum_labels += y;
                self.sum_sq_labels += y * y;
            }
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean_squared_error(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sum_sq_error / self.count as f64 }
    }

    pub fn mean_absolute_error(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sum_abs_error / self.count as f64 }
    }

    pub fn root_mean_squared_error(&self) -> f64 {
        self.mean_squared_error().sqrt()
    }

    /// Coefficient of determination; `0.0` when the labels have no variance.
    pub fn r_squared(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as f64;
        let total = self.sum_sq_labels - self.sum_labels * self.sum_labels / n;
        if total <= 0.0 { 0.0 } else { 1.0 - self.sum_sq_error / total }
    }

    pub fn stats(&self) -> String {
        format!(
            "MSE: {:.6}  MAE: {:.6}  RMSE: {:.6}  R^2: {:.6}  (n = {})",
            self.mean_squared_error(),
            self.mean_absolute_error(),
            self.root_mean_squared_error(),
            self.r_squared(),
            self.count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_on_a_known_example() {
        let mut eval = RegressionEvaluation::new();
        let labels = Matrix::from_data(vec![vec![1.0], vec![2.0], vec![3.0]]);
        let preds = Matrix::from_data(vec![vec![1.0], vec![2.0], vec![5.0]]);
        eval.eval(&labels, &preds);
        assert!((eval.mean_squared_error() - 4.0 / 3.0).abs() < 1e-12);
        assert!((eval.mean_absolute_error() - 2.0 / 3.0).abs() < 1e-12);
        // total sum of squares = 2, residual = 4
        assert!((eval.r_squared() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn perfect_predictions() {
        let mut eval = RegressionEvaluation::new();
        let labels = Matrix::from_data(vec![vec![10.0, 20.0]]);
        eval.eval(&labels, &labels);
        assert_eq!(eval.mean_squared_error(), 0.0);
        assert_eq!(eval.count(), 2);
    }
}
