//! JSON result writer for training, evaluation, and prediction outputs.

use std::fs;
use std::path::{Path, PathBuf};

use fraudtree_rf::{ConfusionMatrix, FeatureKind, RandomForest, RandomForestConfig};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::{ExperimentName, TransactionDataset};
use crate::IoError;

/// Class names used in evaluation artifacts, indexed by label.
const CLASS_NAMES: [&str; 2] = ["legit", "fraud"];

/// Writes run artifacts to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_train.json`,
/// `{experiment}_evaluate.json`, and `{experiment}_predictions.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write a training summary to `{experiment}_train.json`.
    ///
    /// Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_train(
        &self,
        dataset: &TransactionDataset,
        forest: &RandomForest,
        model_path: &Path,
    ) -> Result<PathBuf, IoError> {
        let features: Vec<FeatureEntry<'_>> = dataset
            .feature_names()
            .iter()
            .zip(forest.feature_types())
            .map(|(&name, &kind)| FeatureEntry { name, kind })
            .collect();

        let trees: Vec<TreeEntry> = forest
            .trees()
            .iter()
            .map(|t| TreeEntry {
                n_nodes: t.n_nodes(),
                n_leaves: t.n_leaves(),
                depth: t.depth(),
            })
            .collect();

        let artifact = TrainArtifact {
            experiment: self.experiment.as_str(),
            n_samples: dataset.n_samples(),
            n_fraud: dataset.n_fraud(),
            reference_year: dataset.reference_year(),
            model_path,
            config: forest.config(),
            features,
            trees,
        };

        self.write_json("train", &artifact)
    }

    /// Write evaluation metrics to `{experiment}_evaluate.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_evaluation(&self, confusion: &ConfusionMatrix) -> Result<PathBuf, IoError> {
        let class_metrics: Vec<ClassEntry> = confusion
            .class_metrics()
            .into_iter()
            .map(|m| ClassEntry {
                class: m.class,
                name: CLASS_NAMES[m.class],
                precision: m.precision,
                recall: m.recall,
                f1: m.f1,
                support: m.support,
            })
            .collect();

        let artifact = EvaluateArtifact {
            experiment: self.experiment.as_str(),
            n_samples: confusion.total(),
            accuracy: confusion.accuracy(),
            confusion_matrix: confusion.as_rows(),
            class_metrics,
        };

        self.write_json("evaluate", &artifact)
    }

    /// Write per-row predictions to `{experiment}_predictions.json`.
    ///
    /// `ids`, when given, must be parallel to `predictions`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all, fields(n_rows = predictions.len()))]
    pub fn write_predictions(
        &self,
        ids: Option<&[String]>,
        predictions: &[usize],
    ) -> Result<PathBuf, IoError> {
        let entries: Vec<PredictionEntry<'_>> = predictions
            .iter()
            .enumerate()
            .map(|(row, &label)| PredictionEntry {
                row,
                id: ids.and_then(|ids| ids.get(row)).map(String::as_str),
                is_fraud: label,
            })
            .collect();

        let artifact = PredictArtifact {
            experiment: self.experiment.as_str(),
            n_rows: predictions.len(),
            n_flagged: predictions.iter().filter(|&&l| l == 1).count(),
            predictions: entries,
        };

        self.write_json("predictions", &artifact)
    }

    /// Return the path where the model binary should be saved.
    ///
    /// Does not write anything.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_model.bin", self.experiment.as_str()))
    }

    fn write_json(&self, suffix: &str, artifact: &impl Serialize) -> Result<PathBuf, IoError> {
        let path = self
            .output_dir
            .join(format!("{}_{suffix}.json", self.experiment.as_str()));

        let json = serde_json::to_string_pretty(artifact)
            .map_err(|e| IoError::Serialize { source: e })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), artifact = suffix, "result written");
        Ok(path)
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct TrainArtifact<'a> {
    experiment: &'a str,
    n_samples: usize,
    n_fraud: usize,
    reference_year: i32,
    model_path: &'a Path,
    config: &'a RandomForestConfig,
    features: Vec<FeatureEntry<'a>>,
    trees: Vec<TreeEntry>,
}

#[derive(Serialize)]
struct FeatureEntry<'a> {
    name: &'a str,
    kind: FeatureKind,
}

#[derive(Serialize)]
struct TreeEntry {
    n_nodes: usize,
    n_leaves: usize,
    depth: usize,
}

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    experiment: &'a str,
    n_samples: usize,
    accuracy: f64,
    confusion_matrix: Vec<Vec<usize>>,
    class_metrics: Vec<ClassEntry>,
}

#[derive(Serialize)]
struct ClassEntry {
    class: usize,
    name: &'static str,
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
}

#[derive(Serialize)]
struct PredictArtifact<'a> {
    experiment: &'a str,
    n_rows: usize,
    n_flagged: usize,
    predictions: Vec<PredictionEntry<'a>>,
}

#[derive(Serialize)]
struct PredictionEntry<'a> {
    row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    is_fraud: usize,
}
