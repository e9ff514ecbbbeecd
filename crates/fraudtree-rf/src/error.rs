use std::path::PathBuf;

/// Coarse classification of [`RfError`] variants.
///
/// Lets callers branch on the failure category without matching every
/// variant individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Training data is inconsistent or unusable.
    InvalidInput,
    /// A hyperparameter is out of range.
    InvalidHyperparameter,
    /// `predict` was called before `fit`.
    NotFitted,
    /// A prediction row does not match the fitted feature layout.
    MalformedRow,
    /// Saving or loading a model failed.
    Persistence,
}

/// Errors from decision tree and Random Forest operations.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when min_samples_split is zero.
    #[error("min_samples_split must be at least 1, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when max_features exceeds n_features.
    #[error("max_features is {max_features}, but the data has only {n_features} feature slots")]
    InvalidMaxFeatures {
        /// The requested max_features value.
        max_features: usize,
        /// The number of feature slots in the dataset.
        n_features: usize,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the feature-type descriptor declares zero slots.
    #[error("feature-type descriptor declares zero feature slots")]
    ZeroFeatures,

    /// Returned when the number of labels differs from the number of rows.
    #[error("got {n_labels} labels for {n_rows} rows")]
    LabelCountMismatch {
        /// Number of feature rows.
        n_rows: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when true and predicted label slices differ in length.
    #[error("got {n_predictions} predictions for {n_labels} true labels")]
    PredictionCountMismatch {
        /// Number of true labels.
        n_labels: usize,
        /// Number of predicted labels.
        n_predictions: usize,
    },

    /// Returned when a label is not 0 or 1.
    #[error("label {label} at sample {sample_index} is not a binary class (0 or 1)")]
    InvalidLabel {
        /// The offending label value.
        label: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a training row has a different width than the descriptor.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The descriptor length.
        expected: usize,
        /// The actual number of values in the row.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a training cell does not match its declared feature type.
    #[error("sample {sample_index}, feature {feature_index}: expected a {expected} value")]
    FeatureTypeMismatch {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature slot.
        feature_index: usize,
        /// The declared type tag of the slot.
        expected: &'static str,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature slot.
        feature_index: usize,
    },

    /// Returned when a feature-type tag is neither `numeric` nor `categorical`.
    #[error("unknown feature type \"{tag}\" (expected \"numeric\" or \"categorical\")")]
    UnknownFeatureType {
        /// The unrecognized tag.
        tag: String,
    },

    /// Returned when predicting with a model that has not been fitted.
    #[error("model has not been fitted")]
    NotFitted,

    /// Returned when a prediction row does not fit the trained feature layout.
    #[error("malformed row {row_index}, feature {feature_index}: {reason}")]
    MalformedRow {
        /// The zero-based index of the offending row.
        row_index: usize,
        /// The zero-based slot index (equal to the row width for width errors).
        feature_index: usize,
        /// Human-readable description of the problem.
        reason: String,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}

impl RfError {
    /// Return the failure category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            RfError::InvalidTreeCount { .. }
            | RfError::InvalidMinSamplesSplit { .. }
            | RfError::InvalidMaxFeatures { .. } => ErrorKind::InvalidHyperparameter,
            RfError::EmptyDataset
            | RfError::ZeroFeatures
            | RfError::LabelCountMismatch { .. }
            | RfError::PredictionCountMismatch { .. }
            | RfError::InvalidLabel { .. }
            | RfError::FeatureCountMismatch { .. }
            | RfError::FeatureTypeMismatch { .. }
            | RfError::NonFiniteValue { .. }
            | RfError::UnknownFeatureType { .. } => ErrorKind::InvalidInput,
            RfError::NotFitted => ErrorKind::NotFitted,
            RfError::MalformedRow { .. } => ErrorKind::MalformedRow,
            RfError::SerializeModel { .. }
            | RfError::DeserializeModel { .. }
            | RfError::WriteModel { .. }
            | RfError::ReadModel { .. }
            | RfError::IncompatibleModelVersion { .. } => ErrorKind::Persistence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, RfError};

    #[test]
    fn kinds_cover_caller_conditions() {
        assert_eq!(
            RfError::LabelCountMismatch { n_rows: 3, n_labels: 2 }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            RfError::PredictionCountMismatch { n_labels: 3, n_predictions: 2 }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            RfError::UnknownFeatureType { tag: "date".into() }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            RfError::InvalidMinSamplesSplit { min_samples_split: 0 }.kind(),
            ErrorKind::InvalidHyperparameter
        );
        assert_eq!(RfError::NotFitted.kind(), ErrorKind::NotFitted);
        assert_eq!(
            RfError::MalformedRow {
                row_index: 0,
                feature_index: 1,
                reason: "x".into(),
            }
            .kind(),
            ErrorKind::MalformedRow
        );
    }

    #[test]
    fn malformed_row_message_names_row_and_slot() {
        let err = RfError::MalformedRow {
            row_index: 4,
            feature_index: 2,
            reason: "expected a numeric value".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed row 4, feature 2: expected a numeric value"
        );
    }
}
