use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use fraudtree_io::{ExperimentName, ResultWriter, TransactionDataset, TransactionReader};
use fraudtree_rf::{ConfusionMatrix, RandomForest, RandomForestConfig, Seeding};

#[derive(Parser)]
#[command(name = "fraudtree")]
#[command(about = "Card-transaction fraud scoring with CART decision trees and random forests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducible training (fresh entropy if omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Input and output locations shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Path to the pipe-delimited transaction file
    #[arg(long)]
    data: PathBuf,

    /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
    #[arg(long)]
    experiment: String,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Year ages are measured against (defaults to the current UTC year)
    #[arg(long)]
    reference_year: Option<i32>,
}

#[derive(Subcommand)]
enum Command {
    /// Train a random forest on labelled transactions and save it
    Train {
        #[command(flatten)]
        run: RunArgs,

        /// Number of trees in the forest
        #[arg(long, default_value_t = 10)]
        n_trees: usize,

        /// Maximum tree depth
        #[arg(long, default_value_t = 6)]
        max_depth: usize,

        /// Minimum samples a node needs before a split is attempted
        #[arg(long, default_value_t = 10)]
        min_samples_split: usize,

        /// Features sampled per node (all if not set)
        #[arg(long)]
        max_features: Option<usize>,

        /// Let --seed also fix per-node feature sampling, not just bootstraps
        #[arg(long, default_value_t = false)]
        full_seeding: bool,
    },

    /// Score a saved model against labelled transactions
    Evaluate {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Flag transactions with a saved model
    Predict {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    experiment: String,
    n_samples: usize,
    n_fraud: usize,
    n_trees: usize,
    training_accuracy: f64,
    model_path: PathBuf,
}

#[derive(Serialize)]
struct EvaluateOutput {
    experiment: String,
    n_samples: usize,
    accuracy: f64,
    fraud_precision: f64,
    fraud_recall: f64,
    confusion_matrix: Vec<Vec<usize>>,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    n_rows: usize,
    n_flagged: usize,
    predictions_path: PathBuf,
}

fn open_writer(run: &RunArgs) -> Result<ResultWriter> {
    let experiment =
        ExperimentName::new(run.experiment.clone()).context("invalid experiment name")?;
    ResultWriter::new(&run.output_dir, experiment).context("failed to prepare output directory")
}

fn read_transactions(run: &RunArgs, labelled: bool) -> Result<TransactionDataset> {
    let mut reader = TransactionReader::new(&run.data);
    if let Some(year) = run.reference_year {
        reader = reader.with_reference_year(year);
    }
    if !labelled {
        reader = reader.unlabelled();
    }
    reader
        .read()
        .with_context(|| format!("failed to read transactions from {}", run.data.display()))
}

fn labels_of(dataset: &TransactionDataset) -> Result<&[usize]> {
    dataset
        .labels()
        .context("transaction file has no is_fraud labels")
}

fn load_model(path: &Path) -> Result<RandomForest> {
    RandomForest::load(path).with_context(|| format!("failed to load model from {}", path.display()))
}

fn print_json(output: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train {
            run,
            n_trees,
            max_depth,
            min_samples_split,
            max_features,
            full_seeding,
        } => {
            let writer = open_writer(&run)?;
            let dataset = read_transactions(&run, true)?;
            let labels = labels_of(&dataset)?;

            let seeding = if full_seeding {
                Seeding::Full
            } else {
                Seeding::BootstrapOnly
            };
            let config = RandomForestConfig::new(n_trees)
                .context("invalid forest configuration")?
                .with_max_depth(max_depth)
                .with_min_samples_split(min_samples_split)
                .with_max_features(max_features)
                .with_seed(cli.seed)
                .with_seeding(seeding);
            let forest = config
                .fit(dataset.rows(), labels, dataset.feature_types())
                .context("random forest training failed")?;

            let predicted = forest
                .predict(dataset.rows())
                .context("prediction on training set failed")?;
            let training = ConfusionMatrix::from_labels(labels, &predicted)
                .context("failed to score training predictions")?;

            let model_path = writer.model_path();
            forest.save(&model_path).context("failed to save model")?;
            writer
                .write_train(&dataset, &forest, &model_path)
                .context("failed to write training summary")?;

            info!(
                accuracy = training.accuracy(),
                path = %model_path.display(),
                "training complete"
            );

            print_json(&TrainOutput {
                experiment: run.experiment,
                n_samples: dataset.n_samples(),
                n_fraud: dataset.n_fraud(),
                n_trees: forest.n_trees(),
                training_accuracy: training.accuracy(),
                model_path,
            })?;
        }

        Command::Evaluate { model, run } => {
            let writer = open_writer(&run)?;
            let forest = load_model(&model)?;
            let dataset = read_transactions(&run, true)?;
            let labels = labels_of(&dataset)?;

            let predicted = forest
                .predict(dataset.rows())
                .context("prediction failed")?;
            let confusion = ConfusionMatrix::from_labels(labels, &predicted)
                .context("failed to score predictions")?;
            writer
                .write_evaluation(&confusion)
                .context("failed to write evaluation result")?;

            eprintln!("{confusion}");

            let metrics = confusion.class_metrics();
            let fraud = &metrics[1];
            print_json(&EvaluateOutput {
                experiment: run.experiment,
                n_samples: dataset.n_samples(),
                accuracy: confusion.accuracy(),
                fraud_precision: fraud.precision,
                fraud_recall: fraud.recall,
                confusion_matrix: confusion.as_rows(),
            })?;
        }

        Command::Predict { model, run } => {
            let writer = open_writer(&run)?;
            let forest = load_model(&model)?;
            let dataset = read_transactions(&run, false)?;

            let predicted = forest
                .predict(dataset.rows())
                .context("prediction failed")?;
            let predictions_path = writer
                .write_predictions(dataset.ids(), &predicted)
                .context("failed to write predictions")?;

            print_json(&PredictOutput {
                experiment: run.experiment,
                n_rows: predicted.len(),
                n_flagged: predicted.iter().filter(|&&l| l == 1).count(),
                predictions_path,
            })?;
        }
    }

    Ok(())
}
