use std::collections::HashMap;
use std::fmt;

/// Number of classes handled by the classifier (fraud / not-fraud).
pub const N_CLASSES: usize = 2;

/// Zero-based feature slot index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature slot index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into a `Vec<Node>` arena, identifying a specific node in a decision tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Gini impurity of a node.
#[derive(
    Debug, Clone, Copy, PartialEq, PartialOrd,
    serde::Serialize, serde::Deserialize,
)]
pub struct Impurity(f64);

impl Impurity {
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw impurity value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Impurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// Category-to-rank mapping learned at a categorical split.
///
/// Categories are held in ascending order of their positive-label rate in
/// the node's training subset. Serialized as the ordered token list; the
/// lookup map is rebuilt on deserialization.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct CategoryOrdering {
    categories: Vec<String>,
    ranks: HashMap<String, usize>,
}

impl CategoryOrdering {
    /// Return the rank of `token`, or `None` if it was not seen in training.
    #[must_use]
    pub fn rank(&self, token: &str) -> Option<usize> {
        self.ranks.get(token).copied()
    }

    /// Return the categories in rank order.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Return the number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Return `true` if the ordering holds no categories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl From<Vec<String>> for CategoryOrdering {
    fn from(categories: Vec<String>) -> Self {
        let ranks = categories
            .iter()
            .enumerate()
            .map(|(rank, token)| (token.clone(), rank))
            .collect();
        Self { categories, ranks }
    }
}

impl From<CategoryOrdering> for Vec<String> {
    fn from(ordering: CategoryOrdering) -> Self {
        ordering.categories
    }
}

/// A node in a decision tree arena.
///
/// Trees are stored as `Vec<Node>` where children are referenced by
/// [`NodeIndex`] rather than pointers. Every child index is referenced by
/// exactly one parent.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// An interior split node.
    Split {
        /// Feature slot used for the split.
        feature: FeatureIndex,
        /// Samples with value (or category rank) <= threshold go left.
        threshold: f64,
        /// Rank mapping for categorical splits; `None` for numeric splits.
        ordering: Option<CategoryOrdering>,
        /// Index of the left child node.
        left: NodeIndex,
        /// Index of the right child node.
        right: NodeIndex,
        /// Impurity at this node before splitting.
        impurity: Impurity,
        /// Number of training samples that reached this node.
        n_samples: usize,
        /// Information gain of the chosen split.
        gain: f64,
    },
    /// A terminal leaf node.
    Leaf {
        /// Predicted class (majority of `class_counts`).
        prediction: usize,
        /// Training sample count per class.
        class_counts: [usize; N_CLASSES],
        /// Impurity at this leaf.
        impurity: Impurity,
        /// Number of training samples in this leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Return the impurity at this node (before splitting for interior nodes).
    #[must_use]
    pub fn impurity(&self) -> Impurity {
        match self {
            Node::Split { impurity, .. } | Node::Leaf { impurity, .. } => *impurity,
        }
    }

    /// Return the number of training samples that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}
