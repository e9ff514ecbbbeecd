//! Criterion benchmarks for fraudtree-rf: tree and forest training and prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use fraudtree_rf::{DecisionTreeConfig, FeatureKind, FeatureValue, RandomForestConfig, Seeding};

/// Six transaction-shaped features: three numeric, one categorical, two numeric.
fn make_transactions(n_samples: usize, seed: u64) -> (Vec<Vec<FeatureValue>>, Vec<usize>) {
    let categories = ["grocery_pos", "gas_transport", "shopping_net", "misc_net", "home"];
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let distance = rng.r#gen::<f64>() * 150.0;
        let age = rng.gen_range(18..90) as f64;
        let time = rng.gen_range(0..8640) as f64;
        let category = categories[rng.gen_range(0..categories.len())];
        let amount = rng.r#gen::<f64>() * 1200.0;
        let gender = if rng.r#gen::<bool>() { "F" } else { "M" };
        labels.push(usize::from(amount > 800.0 || (category == "shopping_net" && age > 70.0)));
        rows.push(vec![
            FeatureValue::from(distance),
            FeatureValue::from(gender),
            FeatureValue::from(age),
            FeatureValue::from(time),
            FeatureValue::from(category),
            FeatureValue::from(amount),
        ]);
    }
    (rows, labels)
}

fn kinds() -> Vec<FeatureKind> {
    use FeatureKind::{Categorical, Numeric};
    vec![Numeric, Categorical, Numeric, Numeric, Categorical, Numeric]
}

fn bench_tree_train(c: &mut Criterion) {
    let (rows, labels) = make_transactions(2000, 42);
    let cfg = DecisionTreeConfig::new().with_seed(Some(42));

    c.bench_function("tree_train_2000x6", |b| {
        b.iter(|| cfg.fit(&rows, &labels, &kinds()).unwrap());
    });
}

fn bench_forest_train(c: &mut Criterion) {
    let (rows, labels) = make_transactions(2000, 42);
    let cfg = RandomForestConfig::new(20)
        .unwrap()
        .with_max_features(Some(3))
        .with_seed(Some(42))
        .with_seeding(Seeding::Full);

    c.bench_function("forest_train_2000x6_20trees", |b| {
        b.iter(|| cfg.fit(&rows, &labels, &kinds()).unwrap());
    });
}

fn bench_forest_predict(c: &mut Criterion) {
    let (rows, labels) = make_transactions(2000, 42);
    let forest = RandomForestConfig::new(20)
        .unwrap()
        .with_seed(Some(42))
        .fit(&rows, &labels, &kinds())
        .unwrap();

    c.bench_function("forest_predict_2000x6_20trees", |b| {
        b.iter(|| forest.predict(&rows).unwrap());
    });
}

criterion_group!(benches, bench_tree_train, bench_forest_train, bench_forest_predict);
criterion_main!(benches);
