//! Domain types for fraudtree-io.

use fraudtree_rf::{FeatureKind, FeatureValue};

use crate::features::{FEATURE_KINDS, FEATURE_NAMES};
use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        let valid = !name.is_empty()
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if !valid {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transactions converted to model rows.
///
/// Produced by [`TransactionReader`](crate::TransactionReader). `rows[i]`
/// corresponds to `labels[i]` and `ids[i]` when those are present.
#[derive(Debug)]
pub struct TransactionDataset {
    rows: Vec<Vec<FeatureValue>>,
    labels: Option<Vec<usize>>,
    ids: Option<Vec<String>>,
    reference_year: i32,
}

impl TransactionDataset {
    pub(crate) fn new(
        rows: Vec<Vec<FeatureValue>>,
        labels: Option<Vec<usize>>,
        ids: Option<Vec<String>>,
        reference_year: i32,
    ) -> Self {
        Self { rows, labels, ids, reference_year }
    }

    /// Return the feature rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<FeatureValue>] {
        &self.rows
    }

    /// Return the fraud labels, if the file carried an `is_fraud` column.
    #[must_use]
    pub fn labels(&self) -> Option<&[usize]> {
        self.labels.as_deref()
    }

    /// Return the transaction identifiers, if the file carried a `trans_num` column.
    #[must_use]
    pub fn ids(&self) -> Option<&[String]> {
        self.ids.as_deref()
    }

    /// Return the year ages were measured against.
    #[must_use]
    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Return the feature slot names.
    #[must_use]
    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }

    /// Return the feature slot types.
    #[must_use]
    pub fn feature_types(&self) -> &'static [FeatureKind] {
        &FEATURE_KINDS
    }

    /// Return the number of transactions.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.rows.len()
    }

    /// Return the number of transactions labelled as fraud.
    #[must_use]
    pub fn n_fraud(&self) -> usize {
        self.labels
            .as_ref()
            .map_or(0, |labels| labels.iter().filter(|&&l| l == 1).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experiment_name_valid() {
        let name = ExperimentName::new("fraud-run_07".to_string()).unwrap();
        assert_eq!(name.as_str(), "fraud-run_07");
        assert_eq!(name.to_string(), "fraud-run_07");
    }

    #[test]
    fn experiment_name_rejects_empty() {
        let name = ExperimentName::new(String::new());
        assert!(matches!(name, Err(IoError::InvalidExperimentName { .. })));
    }

    #[test]
    fn experiment_name_rejects_path_separators() {
        for bad in ["../escape", "a b", "run/1", "naïve"] {
            let name = ExperimentName::new(bad.to_string());
            assert!(matches!(name, Err(IoError::InvalidExperimentName { .. })), "{bad}");
        }
    }

    #[test]
    fn dataset_counts_fraud() {
        let rows = vec![vec![FeatureValue::from(1.0)]; 3];
        let ds = TransactionDataset::new(rows, Some(vec![0, 1, 1]), None, 2024);
        assert_eq!(ds.n_samples(), 3);
        assert_eq!(ds.n_fraud(), 2);
        assert_eq!(ds.feature_types().len(), ds.feature_names().len());
    }

    #[test]
    fn unlabelled_dataset_has_no_fraud_count() {
        let ds = TransactionDataset::new(vec![], None, None, 2024);
        assert!(ds.labels().is_none());
        assert_eq!(ds.n_fraud(), 0);
    }
}
