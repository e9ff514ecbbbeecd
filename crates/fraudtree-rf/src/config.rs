//! Configuration builder for Random Forest training.

use crate::error::RfError;
use crate::feature::{FeatureKind, FeatureValue};
use crate::forest::RandomForest;
use crate::tree::DecisionTreeConfig;

/// How far the forest seed reaches into training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Seeding {
    /// The seed fixes the bootstrap draws only; each tree samples features
    /// per node from fresh entropy.
    BootstrapOnly,
    /// The seed also fixes one feature-sampling seed per tree, making the
    /// whole forest reproducible.
    Full,
}

/// Configuration for Random Forest training.
///
/// Construct via [`RandomForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default          |
/// |---------------------|------------------|
/// | `max_depth`         | 6                |
/// | `min_samples_split` | 10               |
/// | `max_features`      | `None` (all)     |
/// | `seed`              | `None` (entropy) |
/// | `seeding`           | `BootstrapOnly`  |
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_depth: usize,
    pub(crate) min_samples_split: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: Option<u64>,
    pub(crate) seeding: Seeding,
}

impl RandomForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_depth: 6,
            min_samples_split: 10,
            max_features: None,
            seed: None,
            seeding: Seeding::BootstrapOnly,
        })
    }

    // --- Setters ---

    /// Set the maximum tree depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the number of features sampled at each node of every tree.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the forest seed.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Set how far the forest seed reaches.
    #[must_use]
    pub fn with_seeding(mut self, seeding: Seeding) -> Self {
        self.seeding = seeding;
        self
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the maximum depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Return the minimum samples required to split a node.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the number of features sampled per node, if set.
    #[must_use]
    pub fn max_features(&self) -> Option<usize> {
        self.max_features
    }

    /// Return the forest seed, if set.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Return the seeding mode.
    #[must_use]
    pub fn seeding(&self) -> Seeding {
        self.seeding
    }

    /// Per-tree configuration shared by every member of the ensemble.
    pub(crate) fn tree_config(&self) -> DecisionTreeConfig {
        DecisionTreeConfig::new()
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_max_features(self.max_features)
    }

    /// Train a Random Forest in one step.
    ///
    /// # Errors
    ///
    /// See [`RandomForest::fit`].
    pub fn fit(
        &self,
        rows: &[Vec<FeatureValue>],
        labels: &[usize],
        feature_types: &[FeatureKind],
    ) -> Result<RandomForest, RfError> {
        let mut forest = RandomForest::new(self.clone());
        forest.fit(rows, labels, feature_types)?;
        Ok(forest)
    }
}
