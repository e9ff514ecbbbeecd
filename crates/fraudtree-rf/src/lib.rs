//! Fraud-scoring classifiers: a CART decision tree and a bagged forest.
//!
//! Both estimators train on row-major mixed data. Each feature slot is
//! either numeric or categorical, declared by a [`FeatureKind`] descriptor.
//! Labels are binary: 0 is legitimate, 1 is fraud. Splits are chosen by
//! Gini information gain; categorical features are ordered by their
//! positive-label rate so a single threshold can split them.
//!
//! ```no_run
//! use fraudtree_rf::{FeatureKind, FeatureValue, RandomForestConfig};
//!
//! let rows = vec![
//!     vec![FeatureValue::from(12.5), FeatureValue::from("grocery")],
//!     vec![FeatureValue::from(980.0), FeatureValue::from("online")],
//! ];
//! let labels = vec![0, 1];
//! let kinds = [FeatureKind::Numeric, FeatureKind::Categorical];
//!
//! let forest = RandomForestConfig::new(10)?
//!     .with_min_samples_split(2)
//!     .with_seed(Some(42))
//!     .fit(&rows, &labels, &kinds)?;
//! let predicted = forest.predict(&rows)?;
//! # Ok::<(), fraudtree_rf::RfError>(())
//! ```

mod config;
mod confusion;
mod error;
mod feature;
mod forest;
mod node;
mod predict;
mod serialize;
mod split;
mod tree;

pub use config::{RandomForestConfig, Seeding};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use error::{ErrorKind, RfError};
pub use feature::{FeatureKind, FeatureValue};
pub use forest::RandomForest;
pub use node::{CategoryOrdering, FeatureIndex, Impurity, N_CLASSES, Node, NodeIndex};
pub use split::{impurity, information_gain, weighted_impurity};
pub use tree::{DecisionTree, DecisionTreeConfig, FittedTree};
