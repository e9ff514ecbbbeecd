//! Confusion matrix and per-class metrics for binary fraud labels.

use std::fmt;

use crate::error::RfError;
use crate::node::N_CLASSES;

/// Display names for class 0 and class 1.
const CLASS_NAMES: [&str; N_CLASSES] = ["legit", "fraud"];

/// A 2x2 confusion matrix.
///
/// Entry `matrix[true_class][predicted_class]` counts how many samples
/// with true label `true_class` were predicted as `predicted_class`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    matrix: [[usize; N_CLASSES]; N_CLASSES],
}

/// Per-class precision, recall, and F1 score.
#[derive(Debug, Clone)]
pub struct ClassMetrics {
    /// The class label.
    pub class: usize,
    /// Precision: TP / (TP + FP). 0.0 if no predictions for this class.
    pub precision: f64,
    /// Recall: TP / (TP + FN). 0.0 if no true samples for this class.
    pub recall: f64,
    /// F1: 2 * precision * recall / (precision + recall). 0.0 if both are zero.
    pub f1: f64,
    /// Number of true samples in this class.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from true and predicted labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::EmptyDataset`] | Zero labels provided |
    /// | [`RfError::PredictionCountMismatch`] | The two slices differ in length |
    /// | [`RfError::InvalidLabel`] | A label is not 0 or 1 |
    pub fn from_labels(true_labels: &[usize], predicted: &[usize]) -> Result<Self, RfError> {
        if true_labels.is_empty() {
            return Err(RfError::EmptyDataset);
        }
        if true_labels.len() != predicted.len() {
            return Err(RfError::PredictionCountMismatch {
                n_labels: true_labels.len(),
                n_predictions: predicted.len(),
            });
        }
        let mut matrix = [[0usize; N_CLASSES]; N_CLASSES];
        for (sample_index, (&t, &p)) in true_labels.iter().zip(predicted).enumerate() {
            if let Some(&label) = [t, p].iter().find(|&&l| l >= N_CLASSES) {
                return Err(RfError::InvalidLabel {
                    label,
                    sample_index,
                });
            }
            matrix[t][p] += 1;
        }
        Ok(Self { matrix })
    }

    /// Overall accuracy: proportion of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..N_CLASSES).map(|i| self.matrix[i][i]).sum();
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }

    /// Total number of scored samples.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Per-class precision, recall, F1, and support.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        (0..N_CLASSES)
            .map(|c| {
                let other = 1 - c;
                let tp = self.matrix[c][c];
                let fp = self.matrix[other][c];
                let fn_ = self.matrix[c][other];
                let support = tp + fn_;
                let precision = if tp + fp == 0 {
                    0.0
                } else {
                    tp as f64 / (tp + fp) as f64
                };
                let recall = if support == 0 {
                    0.0
                } else {
                    tp as f64 / support as f64
                };
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class: c,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Return the matrix rows (`[true_class][predicted_class]`).
    #[must_use]
    pub fn as_rows(&self) -> Vec<Vec<usize>> {
        self.matrix.iter().map(|row| row.to_vec()).collect()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>11}", "")?;
        for name in CLASS_NAMES {
            write!(f, " pred_{name:<5}")?;
        }
        writeln!(f)?;

        for (name, row) in CLASS_NAMES.iter().zip(&self.matrix) {
            write!(f, "true_{name:<6}")?;
            for val in row {
                write!(f, " {val:>10}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let labels = vec![0, 0, 1, 1];
        let cm = ConfusionMatrix::from_labels(&labels, &labels).unwrap();
        assert!((cm.accuracy() - 1.0).abs() < f64::EPSILON);
        for m in cm.class_metrics() {
            assert!((m.precision - 1.0).abs() < f64::EPSILON);
            assert!((m.recall - 1.0).abs() < f64::EPSILON);
            assert!((m.f1 - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn known_confusion_matrix() {
        // True: 4 legit, 2 fraud. One legit flagged, one fraud missed.
        let true_labels = vec![0, 0, 0, 0, 1, 1];
        let predicted = vec![0, 0, 0, 1, 1, 0];
        let cm = ConfusionMatrix::from_labels(&true_labels, &predicted).unwrap();
        assert_eq!(cm.as_rows(), vec![vec![3, 1], vec![1, 1]]);

        let fraud = &cm.class_metrics()[1];
        assert!((fraud.precision - 0.5).abs() < 1e-10);
        assert!((fraud.recall - 0.5).abs() < 1e-10);
        assert_eq!(fraud.support, 2);
        assert!((cm.accuracy() - 4.0 / 6.0).abs() < 1e-10);
    }

    #[test]
    fn empty_labels_error() {
        let err = ConfusionMatrix::from_labels(&[], &[]).unwrap_err();
        assert!(matches!(err, RfError::EmptyDataset));
    }

    #[test]
    fn length_mismatch_error() {
        let err = ConfusionMatrix::from_labels(&[0, 1, 1], &[0, 1]).unwrap_err();
        assert!(matches!(
            err,
            RfError::PredictionCountMismatch { n_labels: 3, n_predictions: 2 }
        ));
        assert!(err.to_string().contains("2 predictions for 3 true labels"));
    }

    #[test]
    fn non_binary_label_error() {
        let err = ConfusionMatrix::from_labels(&[0, 1], &[0, 3]).unwrap_err();
        assert!(matches!(err, RfError::InvalidLabel { label: 3, sample_index: 1 }));
    }

    #[test]
    fn no_fraud_support_yields_zero_recall() {
        let cm = ConfusionMatrix::from_labels(&[0, 0], &[0, 0]).unwrap();
        let fraud = &cm.class_metrics()[1];
        assert_eq!(fraud.support, 0);
        assert!((fraud.recall - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn display_formatting() {
        let cm = ConfusionMatrix::from_labels(&[0, 1], &[0, 1]).unwrap();
        let output = format!("{cm}");
        assert!(output.contains("pred_fraud"));
        assert!(output.contains("true_legit"));
    }
}
