//! Gini impurity, information gain, and best-split search.

use crate::feature::Column;
use crate::node::{CategoryOrdering, FeatureIndex, Impurity, N_CLASSES};

/// Distinct-value count above which numeric thresholds come from percentiles.
pub(crate) const MAX_EXACT_THRESHOLDS: usize = 100;

/// Compute the Gini impurity `1 - Σ(p_i²)` of a binary label multiset.
///
/// Returns [`Impurity`] 0.0 for an empty slice.
///
/// # Panics
///
/// Panics if a label is not 0 or 1.
#[must_use]
pub fn impurity(labels: &[usize]) -> Impurity {
    let mut counts = [0usize; N_CLASSES];
    for &label in labels {
        assert!(label < N_CLASSES, "label {label} is not 0 or 1");
        counts[label] += 1;
    }
    gini(&counts, labels.len())
}

/// Size-weighted average impurity of a two-way partition.
///
/// Returns 0.0 when both partitions are empty.
#[must_use]
pub fn weighted_impurity(left: &[usize], right: &[usize]) -> f64 {
    let n = left.len() + right.len();
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    (left.len() as f64 / n) * impurity(left).value()
        + (right.len() as f64 / n) * impurity(right).value()
}

/// Reduction in impurity from splitting `parent` into `left` and `right`.
#[must_use]
pub fn information_gain(parent: &[usize], left: &[usize], right: &[usize]) -> f64 {
    impurity(parent).value() - weighted_impurity(left, right)
}

/// Gini impurity from per-class counts.
pub(crate) fn gini(class_counts: &[usize], n_samples: usize) -> Impurity {
    if n_samples == 0 {
        return Impurity::new(0.0);
    }
    let n = n_samples as f64;
    let sum_sq: f64 = class_counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum();
    Impurity::new(1.0 - sum_sq)
}

/// Count-based equivalent of [`weighted_impurity`].
fn weighted_gini(left: &[usize; N_CLASSES], right: &[usize; N_CLASSES]) -> f64 {
    let n_left: usize = left.iter().sum();
    let n_right: usize = right.iter().sum();
    let n = (n_left + n_right) as f64;
    (n_left as f64 / n) * gini(left, n_left).value()
        + (n_right as f64 / n) * gini(right, n_right).value()
}

/// Result of finding the best split for a node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    pub(crate) ordering: Option<CategoryOrdering>,
    pub(crate) gain: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

/// Winning candidate before the partition is materialized.
struct Candidate {
    feature: usize,
    threshold: f64,
    /// Category codes in rank order, for categorical features.
    ranked_codes: Option<Vec<u32>>,
    gain: f64,
}

/// Split keys for one feature over a node's samples.
///
/// `keys[i]` is the numeric value (or category rank) of `sample_indices[i]`.
struct FeatureKeys {
    keys: Vec<f64>,
    ranked_codes: Option<Vec<u32>>,
}

/// Compute split keys for a numeric or categorical column.
///
/// Categorical columns are encoded by ranking the node's distinct
/// categories on their positive-label rate. Distinct tokens are first put
/// in lexicographic order, then stable-sorted on the rate, so equal rates
/// keep lexicographic order.
fn feature_keys(column: &Column, labels: &[usize], sample_indices: &[usize]) -> FeatureKeys {
    match column {
        Column::Numeric(values) => FeatureKeys {
            keys: sample_indices.iter().map(|&si| values[si]).collect(),
            ranked_codes: None,
        },
        Column::Categorical { codes, tokens } => {
            // (occurrences, positives) per code.
            let mut tally = vec![(0usize, 0usize); tokens.len()];
            for &si in sample_indices {
                let entry = &mut tally[codes[si] as usize];
                entry.0 += 1;
                entry.1 += labels[si];
            }

            let mut present: Vec<u32> = (0..tokens.len() as u32)
                .filter(|&c| tally[c as usize].0 > 0)
                .collect();
            present.sort_by(|&a, &b| tokens[a as usize].cmp(&tokens[b as usize]));

            let rate = |code: u32| {
                let (count, positives) = tally[code as usize];
                if count == 0 {
                    0.0
                } else {
                    positives as f64 / count as f64
                }
            };
            present.sort_by(|&a, &b| rate(a).total_cmp(&rate(b)));

            let mut rank_of = vec![0usize; tokens.len()];
            for (rank, &code) in present.iter().enumerate() {
                rank_of[code as usize] = rank;
            }
            FeatureKeys {
                keys: sample_indices
                    .iter()
                    .map(|&si| rank_of[codes[si] as usize] as f64)
                    .collect(),
                ranked_codes: Some(present),
            }
        }
    }
}

/// Candidate thresholds over sorted distinct keys.
///
/// Midpoints between consecutive values, or for numeric features with more
/// than [`MAX_EXACT_THRESHOLDS`] distinct values, the interior 1st..99th
/// linearly interpolated percentiles.
pub(crate) fn candidate_thresholds(distinct: &[f64], allow_percentiles: bool) -> Vec<f64> {
    if distinct.len() < 2 {
        return Vec::new();
    }
    if allow_percentiles && distinct.len() > MAX_EXACT_THRESHOLDS {
        let last = (distinct.len() - 1) as f64;
        let mut points: Vec<f64> = (0..=100)
            .map(|q| {
                let pos = q as f64 / 100.0 * last;
                let lo = pos.floor() as usize;
                let hi = (lo + 1).min(distinct.len() - 1);
                let frac = pos - lo as f64;
                distinct[lo] + (distinct[hi] - distinct[lo]) * frac
            })
            .collect();
        points.dedup();
        if points.len() <= 2 {
            return Vec::new();
        }
        return points[1..points.len() - 1].to_vec();
    }
    distinct.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
}

/// Find the best split among `candidate_features`.
///
/// Features are scanned in the order given and thresholds in ascending
/// order; a candidate replaces the incumbent only on strictly greater gain,
/// so the first split found wins ties. Returns `None` when no split has
/// strictly positive gain.
pub(crate) fn find_best_split(
    columns: &[Column],
    labels: &[usize],
    sample_indices: &[usize],
    candidate_features: &[usize],
    parent_counts: &[usize; N_CLASSES],
) -> Option<SplitResult> {
    let n_samples = sample_indices.len();
    if n_samples < 2 {
        return None;
    }
    let parent_impurity = gini(parent_counts, n_samples).value();

    let mut best: Option<Candidate> = None;
    let mut best_gain = 0.0f64;

    for &feat_idx in candidate_features {
        let column = &columns[feat_idx];
        let FeatureKeys { keys, ranked_codes } = feature_keys(column, labels, sample_indices);

        // (key, label) pairs sorted by key for an incremental sweep.
        let mut sorted: Vec<(f64, usize)> = keys
            .iter()
            .zip(sample_indices)
            .map(|(&k, &si)| (k, labels[si]))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut distinct: Vec<f64> = sorted.iter().map(|&(k, _)| k).collect();
        distinct.dedup();
        if distinct.len() < 2 {
            continue;
        }

        let thresholds =
            candidate_thresholds(&distinct, matches!(column, Column::Numeric(_)));

        let mut left_counts = [0usize; N_CLASSES];
        let mut right_counts = *parent_counts;
        let mut cursor = 0usize;

        for threshold in thresholds {
            while cursor < n_samples && sorted[cursor].0 <= threshold {
                let class = sorted[cursor].1;
                left_counts[class] += 1;
                right_counts[class] -= 1;
                cursor += 1;
            }
            if cursor == 0 || cursor == n_samples {
                continue;
            }

            let gain = parent_impurity - weighted_gini(&left_counts, &right_counts);
            if gain > best_gain {
                best_gain = gain;
                best = Some(Candidate {
                    feature: feat_idx,
                    threshold,
                    ranked_codes: ranked_codes.clone(),
                    gain,
                });
            }
        }
    }

    let best = best?;
    Some(partition(columns, sample_indices, best))
}

/// Materialize the winning candidate into child index sets and an ordering.
fn partition(columns: &[Column], sample_indices: &[usize], best: Candidate) -> SplitResult {
    let mut left_indices = Vec::with_capacity(sample_indices.len() / 2);
    let mut right_indices = Vec::with_capacity(sample_indices.len() / 2);

    let ordering = match (&columns[best.feature], best.ranked_codes) {
        (Column::Numeric(values), _) => {
            for &si in sample_indices {
                if values[si] <= best.threshold {
                    left_indices.push(si);
                } else {
                    right_indices.push(si);
                }
            }
            None
        }
        (Column::Categorical { codes, tokens }, ranked_codes) => {
            let ranked_codes = ranked_codes.unwrap_or_default();
            let mut rank_of = vec![usize::MAX; tokens.len()];
            for (rank, &code) in ranked_codes.iter().enumerate() {
                rank_of[code as usize] = rank;
            }
            for &si in sample_indices {
                if (rank_of[codes[si] as usize] as f64) <= best.threshold {
                    left_indices.push(si);
                } else {
                    right_indices.push(si);
                }
            }
            let categories: Vec<String> = ranked_codes
                .iter()
                .map(|&code| tokens[code as usize].clone())
                .collect();
            Some(CategoryOrdering::from(categories))
        }
    };

    SplitResult {
        feature: FeatureIndex::new(best.feature),
        threshold: best.threshold,
        ordering,
        gain: best.gain,
        left_indices,
        right_indices,
    }
}
