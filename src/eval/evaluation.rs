use std::fmt::Write;

use crate::math::matrix::Matrix;

/// Confusion counts: `counts[actual][predicted]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> ConfusionMatrix {
        ConfusionMatrix { counts: vec![vec![0; num_classes]; num_classes] }
    }

    pub fn add(&mut self, actual: usize, predicted: usize) {
        self.counts[actual][predicted] += 1;
    }

    pub fn count(&self, actual: usize, predicted: usize) -> usize {
        self.counts[actual][predicted]
    }

    pub fn num_classes(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Samples whose true class is `class`.
    pub fn actual_total(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    /// Samples predicted as `class`.
    pub fn predicted_total(&self, class: usize) -> usize {
        self.counts.iter().map(|row| row[class]).sum()
    }
}

/// Classification metrics accumulated over every evaluated time step.
///
/// For two classes the combined precision, recall and F1 describe the
/// positive class (1); with more classes they are macro averages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    confusion: ConfusionMatrix,
}

impl Evaluation {
    pub fn new(num_classes: usize) -> Evaluation {
        Evaluation { confusion: ConfusionMatrix::new(num_classes) }
    }

    /// Adds one sample: row `t` of `labels` (one-hot) against row `t` of
    /// `predictions` (class scores), compared by argmax.
    pub fn eval(&mut self, labels: &Matrix, predictions: &Matrix) {
        assert_eq!(labels.rows, predictions.rows, "labels and predictions differ in length");
        for (actual, predicted) in labels.data.iter().zip(predictions.data.iter()) {
            self.confusion.add(argmax(actual), argmax(predicted));
        }
    }

    /// Folds another evaluation's counts into this one.
    pub fn merge(&mut self, other: &Evaluation) {
        assert_eq!(self.num_classes(), other.num_classes());
        for a in 0..self.num_classes() {
            for p in 0..self.num_classes() {
                self.confusion.counts[a][p] += other.confusion.counts[a][p];
            }
        }
    }

    pub fn confusion_matrix(&self) -> &ConfusionMatrix {
        &self.confusion
    }

    pub fn num_classes(&self) -> usize {
        self.confusion.num_classes()
    }

    pub fn total(&self) -> usize {
        self.confusion.total()
    }

    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.num_classes()).map(|c| self.confusion.count(c, c)).sum();
        ratio(correct, self.total())
    }

    pub fn precision_of(&self, class: usize) -> f64 {
        ratio(self.confusion.count(class, class), self.confusion.predicted_total(class))
    }

    pub fn recall_of(&self, class: usize) -> f64 {
        ratio(self.confusion.count(class, class), self.confusion.actual_total(class))
    }

    pub fn f1_of(&self, class: usize) -> f64 {
        let (p, r) = (self.precision_of(class), self.recall_of(class));
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }

    pub fn precision(&self) -> f64 {
        self.combined(Evaluation::precision_of)
    }

    pub fn recall(&self) -> f64 {
        self.combined(Evaluation::recall_of)
    }

    pub fn f1(&self) -> f64 {
        self.combined(Evaluation::f1_of)
    }

    fn combined(&self, metric: fn(&Evaluation, usize) -> f64) -> f64 {
        match self.num_classes() {
            0 => 0.0,
            2 => metric(self, 1),
            n => (0..n).map(|c| metric(self, c)).sum::<f64>() / n as f64,
        }
    }

    /// Multi-line report: headline metrics followed by the confusion matrix.
    pub fn stats(&self) -> String {
        let n = self.num_classes();
        let mut out = String::new();

        let _ = writeln!(out, "========================Evaluation Metrics========================");
        let _ = writeln!(out, " # of classes:    {n}");
        let _ = writeln!(out, " Accuracy:        {:.4}", self.accuracy());
        let _ = writeln!(out, " Precision:       {:.4}", self.precision());
        let _ = writeln!(out, " Recall:          {:.4}", self.recall());
        let _ = writeln!(out, " F1 Score:        {:.4}", self.f1());
        if n == 2 {
            let _ = writeln!(out, "Precision, recall & F1: reported for positive class (class 1) only");
        } else {
            let _ = writeln!(out, "Precision, recall & F1: macro-averaged (equally weighted avg. of {n} classes)");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "=========================Confusion Matrix=========================");

        let width = self.total().to_string().len().max(n.to_string().len()).max(1) + 1;
        let header: String = (0..n).map(|c| format!("{c:>width$}")).collect();
        let _ = writeln!(out, "{header}");
        let _ = writeln!(out, "{}", "-".repeat(header.len()));
        for actual in 0..n {
            let row: String = (0..n)
                .map(|p| format!("{:>width$}", self.confusion.count(actual, p)))
                .collect();
            let _ = writeln!(out, "{row} | {actual} = {actual}");
        }
        let _ = writeln!(out);
        let _ = write!(out, "Confusion matrix format: Actual (rowClass) predicted as (columnClass) N times");
        out
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Index of the maximum element in a slice.
pub fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(classes: &[usize]) -> Matrix {
        Matrix::from_data(classes.iter().map(|&c| {
            let mut row = vec![0.0; 2];
            row[c] = 1.0;
            row
        }).collect())
    }

    /// actual:    0 0 0 1 1 1 1 0
    /// predicted: 0 0 1 1 1 0 1 0
    fn binary() -> Evaluation {
        let mut eval = Evaluation::new(2);
        eval.eval(&one_hot(&[0, 0, 0, 1]), &one_hot(&[0, 0, 1, 1]));
        eval.eval(&one_hot(&[1, 1, 1, 0]), &Matrix::from_data(vec![
            vec![0.2, 0.8], vec![0.9, 0.1], vec![0.4, 0.6], vec![0.7, 0.3],
        ]));
        eval
    }

    #[test]
    fn counts_every_time_step() {
        let eval = binary();
        let cm = eval.confusion_matrix();
        assert_eq!(eval.total(), 8);
        assert_eq!((cm.count(0, 0), cm.count(0, 1), cm.count(1, 0), cm.count(1, 1)), (3, 1, 1, 3));
    }

    #[test]
    fn binary_metrics_report_positive_class() {
        let eval = binary();
        assert!((eval.accuracy() - 0.75).abs() < 1e-12);
        assert!((eval.precision() - 0.75).abs() < 1e-12);
        assert!((eval.recall() - 0.75).abs() < 1e-12);
        assert!((eval.f1() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn empty_classes_do_not_divide_by_zero() {
        let mut eval = Evaluation::new(2);
        eval.eval(&one_hot(&[0, 0]), &one_hot(&[0, 0]));
        assert_eq!(eval.precision(), 0.0);
        assert_eq!(eval.recall(), 0.0);
        assert_eq!(eval.f1(), 0.0);
        assert_eq!(eval.accuracy(), 1.0);
    }

    #[test]
    fn multi_class_metrics_are_macro_averaged() {
        let mut eval = Evaluation::new(3);
        let labels = Matrix::from_data(vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]]);
        let preds = Matrix::from_data(vec![vec![0.9, 0.1, 0.0], vec![0.1, 0.8, 0.1], vec![0.6, 0.2, 0.2]]);
        eval.eval(&labels, &preds);
        // precision: class0 1/2, class1 1, class2 0
        assert!((eval.precision() - 0.5).abs() < 1e-12);
        // recall: 1, 1, 0
        assert!((eval.recall() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn merge_adds_counts() {
        let mut a = binary();
        a.merge(&binary());
        assert_eq!(a.total(), 16);
        assert_eq!(a.confusion_matrix().count(1, 1), 6);
    }

    #[test]
    fn stats_contains_metrics_and_matrix() {
        let report = binary().stats();
        assert!(report.contains("Accuracy:        0.7500"));
        assert!(report.contains("F1 Score:        0.7500"));
        assert!(report.contains("positive class (class 1)"));
        assert!(report.contains(" 3 1 | 0 = 0"));
        assert!(report.contains(" 1 3 | 1 = 1"));
    }
}
