//! Majority-vote prediction for the Random Forest ensemble.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::error::RfError;
use crate::feature::{FeatureValue, validate_rows};
use crate::forest::RandomForest;
use crate::node::N_CLASSES;

/// Combine per-tree predictions into one label per row.
///
/// `per_tree[t][r]` is tree `t`'s label for row `r`. On an even split the
/// lowest label wins.
pub(crate) fn majority_vote(per_tree: &[Vec<usize>], n_rows: usize) -> Vec<usize> {
    let mut votes = vec![[0usize; N_CLASSES]; n_rows];
    for predictions in per_tree {
        for (row_votes, &label) in votes.iter_mut().zip(predictions) {
            row_votes[label] += 1;
        }
    }
    votes
        .iter()
        .map(|row_votes| {
            let mut best = 0usize;
            for class in 1..N_CLASSES {
                if row_votes[class] > row_votes[best] {
                    best = class;
                }
            }
            best
        })
        .collect()
}

impl RandomForest {
    /// Predict one label per row by majority vote across trees.
    ///
    /// Rows are validated before any tree is queried; trees are queried in
    /// parallel.
    ///
    /// # Errors
    ///
    /// | Variant                   | When                                                   |
    /// |---------------------------|--------------------------------------------------------|
    /// | [`RfError::NotFitted`]    | the forest has not been fitted                         |
    /// | [`RfError::MalformedRow`] | a row has the wrong width or a value of the wrong type |
    pub fn predict(&self, rows: &[Vec<FeatureValue>]) -> Result<Vec<usize>, RfError> {
        if self.trees.is_empty() {
            return Err(RfError::NotFitted);
        }
        validate_rows(rows, &self.feature_types)?;

        let per_tree: Vec<Vec<usize>> = self
            .trees
            .par_iter()
            .map(|tree| rows.iter().map(|row| tree.predict_row(row)).collect())
            .collect();

        Ok(majority_vote(&per_tree, rows.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::majority_vote;
    use crate::config::RandomForestConfig;
    use crate::error::ErrorKind;
    use crate::feature::{FeatureKind, FeatureValue};
    use crate::forest::RandomForest;
    use crate::RfError;

    #[test]
    fn vote_majority_wins() {
        let per_tree = vec![vec![1, 0], vec![1, 0], vec![0, 0]];
        assert_eq!(majority_vote(&per_tree, 2), vec![1, 0]);
    }

    #[test]
    fn vote_tie_goes_to_lowest_label() {
        let per_tree = vec![vec![1, 0], vec![0, 1]];
        assert_eq!(majority_vote(&per_tree, 2), vec![0, 0]);
    }

    #[test]
    fn single_tree_vote_is_passthrough() {
        let per_tree = vec![vec![1, 0, 1, 1]];
        assert_eq!(majority_vote(&per_tree, 4), vec![1, 0, 1, 1]);
    }

    #[test]
    fn unfitted_forest_errors() {
        let forest = RandomForest::new(RandomForestConfig::new(3).unwrap());
        let err = forest.predict(&[vec![FeatureValue::from(1.0)]]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFitted);
    }

    #[test]
    fn malformed_row_fails_whole_batch() {
        let rows: Vec<Vec<FeatureValue>> = [1.0, 2.0, 8.0, 9.0]
            .iter()
            .map(|&v| vec![FeatureValue::from(v), FeatureValue::from("web")])
            .collect();
        let kinds = [FeatureKind::Numeric, FeatureKind::Categorical];
        let forest = RandomForestConfig::new(3)
            .unwrap()
            .with_min_samples_split(1)
            .with_seed(Some(0))
            .fit(&rows, &[0, 0, 1, 1], &kinds)
            .unwrap();

        let batch = vec![
            vec![FeatureValue::from(1.0), FeatureValue::from("web")],
            vec![FeatureValue::from("nine"), FeatureValue::from("web")],
        ];
        let err = forest.predict(&batch).unwrap_err();
        assert!(matches!(err, RfError::MalformedRow { row_index: 1, feature_index: 0, .. }));
    }

    #[test]
    fn separable_data_predicted_correctly() {
        let rows: Vec<Vec<FeatureValue>> = (0..40)
            .map(|i| vec![FeatureValue::from(i as f64)])
            .collect();
        let labels: Vec<usize> = (0..40).map(|i| usize::from(i >= 20)).collect();
        let forest = RandomForestConfig::new(15)
            .unwrap()
            .with_min_samples_split(2)
            .with_seed(Some(42))
            .fit(&rows, &labels, &[FeatureKind::Numeric])
            .unwrap();
        let probe = vec![vec![FeatureValue::from(2.0)], vec![FeatureValue::from(37.0)]];
        assert_eq!(forest.predict(&probe).unwrap(), vec![0, 1]);
    }
}
