use rand::SeedableRng;
use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, instrument};

use crate::{
    RfError,
    feature::{Column, FeatureKind, FeatureValue, to_columns, validate_rows, validate_training},
    node::{N_CLASSES, Node, NodeIndex},
    split::{find_best_split, gini},
};

/// Configuration for a single decision tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `max_depth`         | 6                     |
/// | `min_samples_split` | 10                    |
/// | `max_features`      | `None` (all features) |
/// | `seed`              | `None` (entropy)      |
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DecisionTreeConfig {
    pub(crate) max_depth: usize,
    pub(crate) min_samples_split: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: Option<u64>,
}

impl DecisionTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: 6,
            min_samples_split: 10,
            max_features: None,
            seed: None,
        }
    }

    /// Set the maximum tree depth (root is depth 0; 0 yields a single leaf).
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

    /// Set the number of features sampled at each node.
    ///
    /// `None` means consider all features. `Some(0)` leaves no candidate
    /// feature, so every node becomes a leaf.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the random seed for per-node feature sampling.
    ///
    /// `None` draws fresh entropy on every fit.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

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

    /// Return the random seed, if set.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Check hyperparameters against the number of feature slots.
    pub(crate) fn validate(&self, n_features: usize) -> Result<(), RfError> {
        if self.min_samples_split < 1 {
            return Err(RfError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if let Some(k) = self.max_features
            && k > n_features
        {
            return Err(RfError::InvalidMaxFeatures {
                max_features: k,
                n_features,
            });
        }
        Ok(())
    }

    /// Train a decision tree in one step.
    ///
    /// # Errors
    ///
    /// See [`DecisionTree::fit`].
    pub fn fit(
        &self,
        rows: &[Vec<FeatureValue>],
        labels: &[usize],
        feature_types: &[FeatureKind],
    ) -> Result<DecisionTree, RfError> {
        let mut tree = DecisionTree::new(self.clone());
        tree.fit(rows, labels, feature_types)?;
        Ok(tree)
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A decision tree classifier over mixed numeric/categorical features.
///
/// Starts unfitted; [`fit`](Self::fit) installs a [`FittedTree`], replacing
/// any previous one.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    config: DecisionTreeConfig,
    fitted: Option<FittedTree>,
}

impl DecisionTree {
    /// Create an unfitted tree with the given configuration.
    #[must_use]
    pub fn new(config: DecisionTreeConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// Return the configuration.
    #[must_use]
    pub fn config(&self) -> &DecisionTreeConfig {
        &self.config
    }

    /// Return the fitted structure, if any.
    #[must_use]
    pub fn fitted(&self) -> Option<&FittedTree> {
        self.fitted.as_ref()
    }

    /// Return `true` once [`fit`](Self::fit) has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Train the tree on row-major data.
    ///
    /// `rows[sample_idx][feature_idx]` must match `feature_types` slot by slot.
    /// `labels[sample_idx]` must be 0 or 1.
    ///
    /// # Errors
    ///
    /// | Variant                             | When                                          |
    /// |-------------------------------------|-----------------------------------------------|
    /// | [`RfError::EmptyDataset`]           | `rows` is empty                               |
    /// | [`RfError::ZeroFeatures`]           | `feature_types` is empty                      |
    /// | [`RfError::LabelCountMismatch`]     | `labels.len() != rows.len()`                  |
    /// | [`RfError::InvalidLabel`]           | a label is not 0 or 1                         |
    /// | [`RfError::FeatureCountMismatch`]   | a row's width differs from `feature_types`    |
    /// | [`RfError::FeatureTypeMismatch`]    | a cell's type differs from its slot type      |
    /// | [`RfError::NonFiniteValue`]         | a numeric cell is NaN or infinite             |
    /// | [`RfError::InvalidMinSamplesSplit`] | `min_samples_split` < 1                       |
    /// | [`RfError::InvalidMaxFeatures`]     | `max_features` exceeds the number of slots    |
    #[instrument(skip_all, fields(n_samples = rows.len()))]
    pub fn fit(
        &mut self,
        rows: &[Vec<FeatureValue>],
        labels: &[usize],
        feature_types: &[FeatureKind],
    ) -> Result<(), RfError> {
        let n_features = validate_training(rows, labels, feature_types)?;
        self.config.validate(n_features)?;

        let columns = to_columns(rows, feature_types);
        let sample_indices: Vec<usize> = (0..rows.len()).collect();
        let mut rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let fitted = grow(
            &columns,
            labels,
            &sample_indices,
            feature_types,
            &self.config,
            &mut rng,
        );
        self.fitted = Some(fitted);
        Ok(())
    }

    /// Predict one label per row.
    ///
    /// Every row is validated before any prediction is made.
    ///
    /// # Errors
    ///
    /// | Variant                   | When                                                      |
    /// |---------------------------|-----------------------------------------------------------|
    /// | [`RfError::NotFitted`]    | the tree has not been fitted                              |
    /// | [`RfError::MalformedRow`] | a row has the wrong width or a value of the wrong type    |
    pub fn predict(&self, rows: &[Vec<FeatureValue>]) -> Result<Vec<usize>, RfError> {
        let fitted = self.fitted.as_ref().ok_or(RfError::NotFitted)?;
        validate_rows(rows, &fitted.feature_types)?;
        Ok(rows.par_iter().map(|row| fitted.predict_row(row)).collect())
    }
}

/// Grow a tree over `sample_indices`, which may repeat (bootstrap draws).
pub(crate) fn grow(
    columns: &[Column],
    labels: &[usize],
    sample_indices: &[usize],
    feature_types: &[FeatureKind],
    config: &DecisionTreeConfig,
    rng: &mut ChaCha8Rng,
) -> FittedTree {
    let mut arena: Vec<Node> = Vec::new();
    let root = build_tree(columns, labels, sample_indices, config, 0, rng, &mut arena);

    debug!(
        root_index = root.index(),
        n_nodes = arena.len(),
        n_samples = sample_indices.len(),
        "decision tree built"
    );

    FittedTree {
        nodes: arena,
        feature_types: feature_types.to_vec(),
    }
}

/// Recursively build the arena-based decision tree.
///
/// Returns the [`NodeIndex`] of the node just created in `arena`.
fn build_tree(
    columns: &[Column],
    labels: &[usize],
    sample_indices: &[usize],
    config: &DecisionTreeConfig,
    depth: usize,
    rng: &mut ChaCha8Rng,
    arena: &mut Vec<Node>,
) -> NodeIndex {
    let n_samples = sample_indices.len();

    let mut class_counts = [0usize; N_CLASSES];
    for &si in sample_indices {
        class_counts[labels[si]] += 1;
    }
    let impurity = gini(&class_counts, n_samples);

    // Majority class; an exact tie goes to the subset's first label.
    let make_leaf = |arena: &mut Vec<Node>| -> NodeIndex {
        let prediction = if class_counts[0] == class_counts[1] {
            sample_indices.first().map_or(0, |&si| labels[si])
        } else if class_counts[1] > class_counts[0] {
            1
        } else {
            0
        };
        let idx = arena.len();
        arena.push(Node::Leaf {
            prediction,
            class_counts,
            impurity,
            n_samples,
        });
        NodeIndex::new(idx)
    };

    let depth_exceeded = depth >= config.max_depth;
    let too_few = n_samples < config.min_samples_split;
    let pure = class_counts.iter().any(|&c| c == n_samples);

    if depth_exceeded || too_few || pure {
        return make_leaf(arena);
    }

    let n_features = columns.len();
    let candidate_features: Vec<usize> = match config.max_features {
        Some(k) => {
            let mut sampled = index::sample(rng, n_features, k.min(n_features)).into_vec();
            sampled.sort_unstable();
            sampled
        }
        None => (0..n_features).collect(),
    };

    let Some(split) =
        find_best_split(columns, labels, sample_indices, &candidate_features, &class_counts)
    else {
        return make_leaf(arena);
    };

    // Arena pattern: reserve index, recurse, then overwrite with the split.
    let node_idx = arena.len();
    arena.push(Node::Leaf {
        prediction: 0,
        class_counts,
        impurity,
        n_samples,
    });

    let left_idx = build_tree(
        columns,
        labels,
        &split.left_indices,
        config,
        depth + 1,
        rng,
        arena,
    );
    let right_idx = build_tree(
        columns,
        labels,
        &split.right_indices,
        config,
        depth + 1,
        rng,
        arena,
    );

    arena[node_idx] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        ordering: split.ordering,
        left: left_idx,
        right: right_idx,
        impurity,
        n_samples,
        gain: split.gain,
    };

    NodeIndex::new(node_idx)
}

/// The learned structure of a decision tree.
///
/// Stored as an arena-based `Vec<Node>` with the root at index 0, together
/// with the feature-type descriptor it was trained on.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FittedTree {
    nodes: Vec<Node>,
    feature_types: Vec<FeatureKind>,
}

impl FittedTree {
    /// Return the root node.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Return the node stored at `index`.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.index()]
    }

    /// Return all nodes in arena order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the feature-type descriptor used at fit time.
    #[must_use]
    pub fn feature_types(&self) -> &[FeatureKind] {
        &self.feature_types
    }

    /// Return the total number of nodes in the tree (both splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of the tree.
    ///
    /// A single-node tree (just a root leaf) has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((0usize, 0usize));

        while let Some((node_idx, d)) = queue.pop_front() {
            match &self.nodes[node_idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    queue.push_back((left.index(), d + 1));
                    queue.push_back((right.index(), d + 1));
                }
            }
        }

        max_depth
    }

    /// Return the nodes visited from the root to the leaf that scores `row`.
    ///
    /// `row` is assumed to match [`feature_types`](Self::feature_types).
    #[must_use]
    pub fn decision_path(&self, row: &[FeatureValue]) -> Vec<NodeIndex> {
        let mut path = Vec::new();
        let mut idx = NodeIndex::new(0);
        loop {
            path.push(idx);
            match self.step(idx, row) {
                Step::Descend(next) => idx = next,
                Step::Leaf(_) => return path,
            }
        }
    }

    /// Predict the label for one pre-validated row.
    pub(crate) fn predict_row(&self, row: &[FeatureValue]) -> usize {
        let mut idx = NodeIndex::new(0);
        loop {
            match self.step(idx, row) {
                Step::Descend(next) => idx = next,
                Step::Leaf(prediction) => return prediction,
            }
        }
    }

    /// Take one descent step from `idx`.
    ///
    /// Categorical tokens absent from the node's ordering go right.
    fn step(&self, idx: NodeIndex, row: &[FeatureValue]) -> Step {
        match &self.nodes[idx.index()] {
            Node::Leaf { prediction, .. } => Step::Leaf(*prediction),
            Node::Split {
                feature,
                threshold,
                ordering,
                left,
                right,
                ..
            } => {
                let value = &row[feature.index()];
                let key = match ordering {
                    Some(ordering) => value
                        .as_category()
                        .and_then(|token| ordering.rank(token))
                        .map(|rank| rank as f64),
                    None => value.as_numeric(),
                };
                match key {
                    Some(k) if k <= *threshold => Step::Descend(*left),
                    _ => Step::Descend(*right),
                }
            }
        }
    }
}

/// Outcome of one traversal step.
enum Step {
    Descend(NodeIndex),
    Leaf(usize),
}
