//! Feature values, feature-type descriptors, and input validation.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::RfError;

/// Declared type of one feature slot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    /// Continuous value split by threshold.
    Numeric,
    /// Raw token split by target-rate ordering.
    Categorical,
}

impl FeatureKind {
    /// Return the descriptor tag (`"numeric"` or `"categorical"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::Numeric => "numeric",
            FeatureKind::Categorical => "categorical",
        }
    }

    /// Parse a whole descriptor from its string tags.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::UnknownFeatureType`] for the first unrecognized tag.
    pub fn parse_all<S: AsRef<str>>(tags: &[S]) -> Result<Vec<FeatureKind>, RfError> {
        tags.iter().map(|t| t.as_ref().parse()).collect()
    }
}

impl FromStr for FeatureKind {
    type Err = RfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "numeric" => Ok(FeatureKind::Numeric),
            "categorical" => Ok(FeatureKind::Categorical),
            other => Err(RfError::UnknownFeatureType {
                tag: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell of a feature row.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum FeatureValue {
    /// A numeric scalar.
    Numeric(f64),
    /// A raw categorical token.
    Categorical(String),
}

impl FeatureValue {
    /// Return the numeric value, if this is a numeric cell.
    #[must_use]
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            FeatureValue::Numeric(v) => Some(*v),
            FeatureValue::Categorical(_) => None,
        }
    }

    /// Return the token, if this is a categorical cell.
    #[must_use]
    pub fn as_category(&self) -> Option<&str> {
        match self {
            FeatureValue::Numeric(_) => None,
            FeatureValue::Categorical(token) => Some(token),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Numeric(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(token: &str) -> Self {
        FeatureValue::Categorical(token.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(token: String) -> Self {
        FeatureValue::Categorical(token)
    }
}

/// One training column in column-major layout.
///
/// Categorical tokens are interned per column so split search works on
/// integer codes; `tokens[code]` recovers the original string.
#[derive(Debug)]
pub(crate) enum Column {
    Numeric(Vec<f64>),
    Categorical { codes: Vec<u32>, tokens: Vec<String> },
}

/// Validate a training set and return the number of feature slots.
///
/// Checks row widths, label count and range, and that every cell matches
/// its declared slot type.
pub(crate) fn validate_training(
    rows: &[Vec<FeatureValue>],
    labels: &[usize],
    feature_types: &[FeatureKind],
) -> Result<usize, RfError> {
    if rows.is_empty() {
        return Err(RfError::EmptyDataset);
    }
    let n_features = feature_types.len();
    if n_features == 0 {
        return Err(RfError::ZeroFeatures);
    }
    if labels.len() != rows.len() {
        return Err(RfError::LabelCountMismatch {
            n_rows: rows.len(),
            n_labels: labels.len(),
        });
    }

    for (sample_index, (row, &label)) in rows.iter().zip(labels).enumerate() {
        if label > 1 {
            return Err(RfError::InvalidLabel {
                label,
                sample_index,
            });
        }
        if row.len() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        for (feature_index, (value, kind)) in row.iter().zip(feature_types).enumerate() {
            match (kind, value) {
                (FeatureKind::Numeric, FeatureValue::Numeric(v)) => {
                    if !v.is_finite() {
                        return Err(RfError::NonFiniteValue {
                            sample_index,
                            feature_index,
                        });
                    }
                }
                (FeatureKind::Categorical, FeatureValue::Categorical(_)) => {}
                (kind, _) => {
                    return Err(RfError::FeatureTypeMismatch {
                        sample_index,
                        feature_index,
                        expected: kind.as_str(),
                    });
                }
            }
        }
    }

    Ok(n_features)
}

/// Check every prediction row against the fitted descriptor.
///
/// Runs before any tree is descended so a bad row fails the whole batch.
pub(crate) fn validate_rows(
    rows: &[Vec<FeatureValue>],
    feature_types: &[FeatureKind],
) -> Result<(), RfError> {
    let n_features = feature_types.len();
    for (row_index, row) in rows.iter().enumerate() {
        if row.len() != n_features {
            return Err(RfError::MalformedRow {
                row_index,
                feature_index: row.len().min(n_features),
                reason: format!("row has {} values, expected {n_features}", row.len()),
            });
        }
        for (feature_index, (value, kind)) in row.iter().zip(feature_types).enumerate() {
            let reason = match (kind, value) {
                (FeatureKind::Numeric, FeatureValue::Numeric(v)) if v.is_finite() => continue,
                (FeatureKind::Numeric, FeatureValue::Numeric(_)) => "numeric value is not finite",
                (FeatureKind::Numeric, FeatureValue::Categorical(_)) => {
                    "expected a numeric value, found a categorical token"
                }
                (FeatureKind::Categorical, FeatureValue::Categorical(_)) => continue,
                (FeatureKind::Categorical, FeatureValue::Numeric(_)) => {
                    "expected a categorical token, found a numeric value"
                }
            };
            return Err(RfError::MalformedRow {
                row_index,
                feature_index,
                reason: reason.to_string(),
            });
        }
    }
    Ok(())
}

/// Convert validated row-major training data to column-major layout.
pub(crate) fn to_columns(rows: &[Vec<FeatureValue>], feature_types: &[FeatureKind]) -> Vec<Column> {
    feature_types
        .iter()
        .enumerate()
        .map(|(feat_idx, kind)| match kind {
            FeatureKind::Numeric => Column::Numeric(
                rows.iter()
                    .map(|row| row[feat_idx].as_numeric().unwrap_or(f64::NAN))
                    .collect(),
            ),
            FeatureKind::Categorical => {
                let mut interned: HashMap<&str, u32> = HashMap::new();
                let mut tokens = Vec::new();
                let codes = rows
                    .iter()
                    .map(|row| {
                        let token = row[feat_idx].as_category().unwrap_or_default();
                        *interned.entry(token).or_insert_with(|| {
                            tokens.push(token.to_string());
                            (tokens.len() - 1) as u32
                        })
                    })
                    .collect();
                Column::Categorical { codes, tokens }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_tags() {
        let kinds = FeatureKind::parse_all(&["numeric", "categorical"]).unwrap();
        assert_eq!(kinds, vec![FeatureKind::Numeric, FeatureKind::Categorical]);
    }

    #[test]
    fn parse_unknown_tag_is_error() {
        let err = FeatureKind::parse_all(&["numeric", "ordinal"]).unwrap_err();
        assert!(matches!(err, RfError::UnknownFeatureType { ref tag } if tag == "ordinal"));
    }

    #[test]
    fn training_label_out_of_range() {
        let rows = vec![vec![FeatureValue::from(1.0)], vec![FeatureValue::from(2.0)]];
        let err = validate_training(&rows, &[0, 2], &[FeatureKind::Numeric]).unwrap_err();
        assert!(matches!(err, RfError::InvalidLabel { label: 2, sample_index: 1 }));
    }

    #[test]
    fn training_type_mismatch() {
        let rows = vec![vec![FeatureValue::from("a")]];
        let err = validate_training(&rows, &[0], &[FeatureKind::Numeric]).unwrap_err();
        assert!(matches!(
            err,
            RfError::FeatureTypeMismatch { sample_index: 0, feature_index: 0, expected: "numeric" }
        ));
    }

    #[test]
    fn rows_wrong_width_is_malformed() {
        let rows = vec![
            vec![FeatureValue::from(1.0), FeatureValue::from("x")],
            vec![FeatureValue::from(1.0)],
        ];
        let err = validate_rows(&rows, &[FeatureKind::Numeric, FeatureKind::Categorical])
            .unwrap_err();
        assert!(matches!(err, RfError::MalformedRow { row_index: 1, feature_index: 1, .. }));
    }

    #[test]
    fn rows_token_in_numeric_slot_is_malformed() {
        let rows = vec![vec![FeatureValue::from("oops")]];
        let err = validate_rows(&rows, &[FeatureKind::Numeric]).unwrap_err();
        assert!(matches!(err, RfError::MalformedRow { row_index: 0, feature_index: 0, .. }));
    }

    #[test]
    fn categorical_columns_intern_in_encounter_order() {
        let rows = vec![
            vec![FeatureValue::from("b")],
            vec![FeatureValue::from("a")],
            vec![FeatureValue::from("b")],
        ];
        let columns = to_columns(&rows, &[FeatureKind::Categorical]);
        match &columns[0] {
            Column::Categorical { codes, tokens } => {
                assert_eq!(codes, &vec![0, 1, 0]);
                assert_eq!(tokens, &vec!["b".to_string(), "a".to_string()]);
            }
            Column::Numeric(_) => panic!("expected categorical column"),
        }
    }
}
