//! Model serialization and deserialization via bincode.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::RfError;
use crate::forest::RandomForest;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope for the serialized model.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    n_trees: usize,
    n_features: usize,
    forest: RandomForest,
}

impl RandomForest {
    /// Save the model to a binary file.
    ///
    /// Uses bincode encoding wrapped in a versioned envelope. Unfitted
    /// forests can be saved too; they load back unfitted.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::SerializeModel`] | bincode encoding failed |
    /// | [`RfError::WriteModel`] | file write failed |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RfError> {
        let path = path.as_ref();

        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_trees: self.trees.len(),
            n_features: self.feature_types.len(),
            forest: self.clone(),
        };

        let bytes = bincode::serialize(&envelope)
            .map_err(|e| RfError::SerializeModel { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| RfError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            size_bytes = bytes.len(),
            n_trees = self.trees.len(),
            "model saved"
        );

        Ok(())
    }

    /// Load a model from a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ReadModel`] | file read failed |
    /// | [`RfError::DeserializeModel`] | bincode decoding failed |
    /// | [`RfError::IncompatibleModelVersion`] | format version mismatch |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RfError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| RfError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        // The version is the envelope's leading field, so it can be checked
        // before the rest of a possibly incompatible layout is decoded.
        let format_version: u32 =
            bincode::deserialize(&bytes).map_err(|e| RfError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            })?;
        if format_version != FORMAT_VERSION {
            return Err(RfError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: format_version,
                path: path.to_path_buf(),
            });
        }

        let envelope: ModelEnvelope =
            bincode::deserialize(&bytes).map_err(|e| RfError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            })?;

        debug!(
            n_trees = envelope.n_trees,
            n_features = envelope.n_features,
            "model loaded"
        );

        Ok(envelope.forest)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::config::{RandomForestConfig, Seeding};
    use crate::error::ErrorKind;
    use crate::feature::{FeatureKind, FeatureValue};
    use crate::forest::RandomForest;
    use crate::tree::DecisionTreeConfig;

    fn training_data() -> (Vec<Vec<FeatureValue>>, Vec<usize>, Vec<FeatureKind>) {
        let merchants = ["shop", "atm", "web"];
        let rows: Vec<Vec<FeatureValue>> = (0..30)
            .map(|i| {
                vec![
                    FeatureValue::from(i as f64 * 1.5),
                    FeatureValue::from(merchants[i % 3]),
                ]
            })
            .collect();
        let labels: Vec<usize> = (0..30).map(|i| usize::from(i > 18 || i % 3 == 2)).collect();
        (rows, labels, vec![FeatureKind::Numeric, FeatureKind::Categorical])
    }

    fn train_simple_model() -> RandomForest {
        let (rows, labels, kinds) = training_data();
        RandomForestConfig::new(5)
            .unwrap()
            .with_min_samples_split(2)
            .with_max_features(Some(1))
            .with_seed(Some(42))
            .with_seeding(Seeding::Full)
            .fit(&rows, &labels, &kinds)
            .unwrap()
    }

    #[test]
    fn round_trip_identical_predictions() {
        let dir = TempDir::new().unwrap();
        let model_path = dir.path().join("test_model.bin");

        let forest = train_simple_model();
        forest.save(&model_path).unwrap();
        let loaded = RandomForest::load(&model_path).unwrap();

        assert_eq!(loaded.trees(), forest.trees());
        assert_eq!(loaded.feature_types(), forest.feature_types());

        let probes = vec![
            vec![FeatureValue::from(1.5), FeatureValue::from("shop")],
            vec![FeatureValue::from(40.0), FeatureValue::from("atm")],
            vec![FeatureValue::from(12.0), FeatureValue::from("never-seen")],
        ];
        assert_eq!(loaded.predict(&probes).unwrap(), forest.predict(&probes).unwrap());
    }

    #[test]
    fn tree_round_trip_through_bincode() {
        let (rows, labels, kinds) = training_data();
        let tree = DecisionTreeConfig::new()
            .with_min_samples_split(2)
            .fit(&rows, &labels, &kinds)
            .unwrap();
        let bytes = bincode::serialize(&tree).unwrap();
        let restored: crate::DecisionTree = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored.fitted(), tree.fitted());
        assert_eq!(restored.predict(&rows).unwrap(), tree.predict(&rows).unwrap());
    }

    #[test]
    fn unfitted_round_trip_stays_unfitted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.bin");
        RandomForest::new(RandomForestConfig::new(2).unwrap())
            .save(&path)
            .unwrap();
        let loaded = RandomForest::load(&path).unwrap();
        assert!(!loaded.is_fitted());
        let err = loaded.predict(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFitted);
    }

    #[test]
    fn version_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.bin");
        let mut bytes = bincode::serialize(&99u32).unwrap();
        bytes.extend_from_slice(&[0u8; 16]);
        std::fs::write(&path, &bytes).unwrap();
        let err = RandomForest::load(&path).unwrap_err();
        assert!(matches!(
            err,
            crate::RfError::IncompatibleModelVersion { expected: 1, found: 99, .. }
        ));
    }

    #[test]
    fn load_nonexistent_file_error() {
        let dir = TempDir::new().unwrap();
        let err = RandomForest::load(dir.path().join("missing.bin")).unwrap_err();
        assert!(matches!(err, crate::RfError::ReadModel { .. }));
    }

    #[test]
    fn load_corrupt_file_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.bin");
        std::fs::write(&path, b"\x01\x00\x00\x00garbage").unwrap();
        let err = RandomForest::load(&path).unwrap_err();
        assert!(matches!(err, crate::RfError::DeserializeModel { .. }));
    }
}
