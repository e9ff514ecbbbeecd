//! Accuracy regression tests for fraudtree-rf.
//!
//! A deterministic synthetic transaction set guards against algorithmic
//! changes that would degrade fraud classification.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use fraudtree_rf::{
    ConfusionMatrix, DecisionTreeConfig, FeatureKind, FeatureValue, RandomForestConfig, Seeding,
};

// ---------------------------------------------------------------------------
// Helper: deterministic synthetic transactions
// ---------------------------------------------------------------------------

const CATEGORIES: [&str; 6] = [
    "grocery_pos",
    "gas_transport",
    "shopping_net",
    "misc_net",
    "home",
    "travel",
];

/// Generate `n` transactions with columns `[amount, category, time]`.
///
/// Fraud when the amount exceeds 600, or when an online category carries an
/// amount above 250. Time is noise.
fn make_transactions(n: usize, seed: u64) -> (Vec<Vec<FeatureValue>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for _ in 0..n {
        let amount = rng.r#gen::<f64>() * 1000.0;
        let category = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];
        let time = rng.gen_range(0..8640) as f64;
        let online = category.ends_with("_net");
        labels.push(usize::from(amount > 600.0 || (online && amount > 250.0)));
        rows.push(vec![
            FeatureValue::from(amount),
            FeatureValue::from(category),
            FeatureValue::from(time),
        ]);
    }
    (rows, labels)
}

fn kinds() -> Vec<FeatureKind> {
    vec![FeatureKind::Numeric, FeatureKind::Categorical, FeatureKind::Numeric]
}

fn accuracy(truth: &[usize], predicted: &[usize]) -> f64 {
    ConfusionMatrix::from_labels(truth, predicted).unwrap().accuracy()
}

// ---------------------------------------------------------------------------
// Decision tree
// ---------------------------------------------------------------------------

#[test]
fn tree_holdout_accuracy_above_threshold() {
    let (train_rows, train_labels) = make_transactions(600, 42);
    let (test_rows, test_labels) = make_transactions(300, 7);
    let tree = DecisionTreeConfig::new()
        .with_min_samples_split(2)
        .fit(&train_rows, &train_labels, &kinds())
        .unwrap();
    let acc = accuracy(&test_labels, &tree.predict(&test_rows).unwrap());
    assert!(acc > 0.9, "tree holdout accuracy {acc} <= 0.9");
}

#[test]
fn tree_training_accuracy_never_below_majority_rate() {
    let (rows, labels) = make_transactions(400, 3);
    let tree = DecisionTreeConfig::new()
        .with_max_depth(1)
        .fit(&rows, &labels, &kinds())
        .unwrap();
    let frauds = labels.iter().filter(|&&l| l == 1).count();
    let majority = frauds.max(labels.len() - frauds) as f64 / labels.len() as f64;
    let acc = accuracy(&labels, &tree.predict(&rows).unwrap());
    assert!(acc >= majority, "stump accuracy {acc} < majority rate {majority}");
}

// ---------------------------------------------------------------------------
// Random forest
// ---------------------------------------------------------------------------

#[test]
fn forest_holdout_accuracy_above_threshold() {
    let (train_rows, train_labels) = make_transactions(600, 42);
    let (test_rows, test_labels) = make_transactions(300, 7);
    let forest = RandomForestConfig::new(25)
        .unwrap()
        .with_min_samples_split(2)
        .with_max_features(Some(2))
        .with_seed(Some(42))
        .with_seeding(Seeding::Full)
        .fit(&train_rows, &train_labels, &kinds())
        .unwrap();
    let acc = accuracy(&test_labels, &forest.predict(&test_rows).unwrap());
    assert!(acc > 0.9, "forest holdout accuracy {acc} <= 0.9");
}

#[test]
fn forest_fully_seeded_predictions_are_deterministic() {
    let (rows, labels) = make_transactions(300, 11);
    let config = RandomForestConfig::new(12)
        .unwrap()
        .with_max_features(Some(1))
        .with_seed(Some(2024))
        .with_seeding(Seeding::Full);
    let a = config.fit(&rows, &labels, &kinds()).unwrap();
    let b = config.fit(&rows, &labels, &kinds()).unwrap();
    assert_eq!(a.predict(&rows).unwrap(), b.predict(&rows).unwrap());
    assert_eq!(a.trees(), b.trees());
}

#[test]
fn forest_predictions_are_binary_and_sized() {
    let (rows, labels) = make_transactions(150, 5);
    let forest = RandomForestConfig::new(5)
        .unwrap()
        .with_seed(Some(5))
        .fit(&rows, &labels, &kinds())
        .unwrap();
    let (probe, _) = make_transactions(40, 6);
    let predicted = forest.predict(&probe).unwrap();
    assert_eq!(predicted.len(), 40);
    assert!(predicted.iter().all(|&l| l <= 1));
}

#[test]
fn forest_trees_respect_max_depth() {
    let (rows, labels) = make_transactions(300, 9);
    let forest = RandomForestConfig::new(6)
        .unwrap()
        .with_max_depth(3)
        .with_min_samples_split(2)
        .with_seed(Some(9))
        .fit(&rows, &labels, &kinds())
        .unwrap();
    for tree in forest.trees() {
        assert!(tree.depth() <= 3, "tree depth {} > 3", tree.depth());
    }
}
