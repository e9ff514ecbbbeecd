//! Random Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::{RandomForestConfig, Seeding};
use crate::error::RfError;
use crate::feature::{FeatureKind, FeatureValue, to_columns, validate_training};
use crate::tree::{FittedTree, grow};

/// A bootstrap-aggregated ensemble of decision trees.
///
/// Starts unfitted; [`fit`](Self::fit) replaces the ensemble wholesale.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) config: RandomForestConfig,
    pub(crate) trees: Vec<FittedTree>,
    pub(crate) feature_types: Vec<FeatureKind>,
}

/// Draw `n_samples` indices uniformly with replacement.
pub(crate) fn bootstrap_sample(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Draw one bootstrap per tree, in tree order, from a single generator.
pub(crate) fn draw_bootstraps(
    n_trees: usize,
    n_samples: usize,
    rng: &mut impl Rng,
) -> Vec<Vec<usize>> {
    (0..n_trees).map(|_| bootstrap_sample(n_samples, rng)).collect()
}

impl RandomForest {
    /// Create an unfitted forest with the given configuration.
    #[must_use]
    pub fn new(config: RandomForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            feature_types: Vec::new(),
        }
    }

    /// Train the ensemble on row-major data.
    ///
    /// All bootstraps are drawn up front from the forest generator, so with
    /// a seed they are identical under either [`Seeding`] mode. Trees are
    /// then grown in parallel, each with its own generator.
    ///
    /// # Errors
    ///
    /// Same conditions as [`DecisionTree::fit`](crate::DecisionTree::fit).
    #[instrument(skip_all, fields(n_trees = self.config.n_trees, n_samples = rows.len()))]
    pub fn fit(
        &mut self,
        rows: &[Vec<FeatureValue>],
        labels: &[usize],
        feature_types: &[FeatureKind],
    ) -> Result<(), RfError> {
        let n_features = validate_training(rows, labels, feature_types)?;
        let tree_config = self.config.tree_config();
        tree_config.validate(n_features)?;

        let n_samples = rows.len();
        let n_trees = self.config.n_trees;

        info!(
            n_trees,
            n_samples,
            n_features,
            max_features = ?self.config.max_features,
            seeding = ?self.config.seeding,
            "training random forest"
        );

        let mut master_rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let bootstraps = draw_bootstraps(n_trees, n_samples, &mut master_rng);
        let split_seeds: Vec<Option<u64>> = match self.config.seeding {
            Seeding::Full => (0..n_trees).map(|_| Some(master_rng.r#gen())).collect(),
            Seeding::BootstrapOnly => vec![None; n_trees],
        };

        let columns = to_columns(rows, feature_types);

        let trees: Vec<FittedTree> = bootstraps
            .into_par_iter()
            .zip(split_seeds)
            .map(|(bootstrap, split_seed)| {
                let mut rng = match split_seed {
                    Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                    None => ChaCha8Rng::from_entropy(),
                };
                grow(&columns, labels, &bootstrap, feature_types, &tree_config, &mut rng)
            })
            .collect();

        debug!(
            n_trees_trained = trees.len(),
            total_nodes = trees.iter().map(FittedTree::n_nodes).sum::<usize>(),
            "tree training complete"
        );

        self.trees = trees;
        self.feature_types = feature_types.to_vec();

        info!("random forest training complete");
        Ok(())
    }

    /// Return the configuration.
    #[must_use]
    pub fn config(&self) -> &RandomForestConfig {
        &self.config
    }

    /// Return `true` once [`fit`](Self::fit) has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Return the fitted trees in training order.
    #[must_use]
    pub fn trees(&self) -> &[FittedTree] {
        &self.trees
    }

    /// Return the number of fitted trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the number of feature slots the forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_types.len()
    }

    /// Return the feature-type descriptor used at fit time.
    #[must_use]
    pub fn feature_types(&self) -> &[FeatureKind] {
        &self.feature_types
    }
}
