//! Transaction ingestion, feature extraction, and result writing for fraudtree.
//!
//! [`TransactionReader`] turns a pipe-delimited card-transaction export into
//! six-slot model rows (see [`FEATURE_NAMES`]); [`ResultWriter`] records what
//! a run produced as JSON next to the saved model.

mod domain;
mod error;
mod features;
mod reader;
mod writer;

pub use domain::{ExperimentName, TransactionDataset};
pub use error::IoError;
pub use features::{
    EARTH_RADIUS_KM, FEATURE_KINDS, FEATURE_NAMES, TIME_BUCKET_SECONDS, Transaction, birth_year,
    haversine_km, time_bucket,
};
pub use reader::{ID_COLUMN, LABEL_COLUMN, REQUIRED_COLUMNS, TransactionReader};
pub use writer::ResultWriter;
