//! Pipe-delimited transaction reader with full input validation.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info, instrument};

use crate::domain::TransactionDataset;
use crate::features::{Transaction, birth_year};
use crate::IoError;

/// Columns every transaction file must carry.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "lat",
    "long",
    "merch_lat",
    "merch_long",
    "gender",
    "dob",
    "unix_time",
    "category",
    "amt",
];

/// Label column; required unless the reader is built with
/// [`TransactionReader::unlabelled`].
pub const LABEL_COLUMN: &str = "is_fraud";

/// Optional identifier column carried through to predictions.
pub const ID_COLUMN: &str = "trans_num";

/// Reads card transactions from a `|`-delimited file and derives model rows.
///
/// Expected format:
/// - Header row required; column order is free and extra columns are ignored
/// - Every [`REQUIRED_COLUMNS`] entry present, plus `is_fraud` for labelled reads
/// - `dob` starts with a four-digit year; `unix_time` is an integer
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed record |
/// | [`IoError::MissingColumn`] | A required column is absent from the header |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has a different field count than the header |
/// | [`IoError::InvalidValue`] | Cell is unparseable or a non-finite number |
/// | [`IoError::InvalidLabel`] | `is_fraud` is not `0` or `1` |
pub struct TransactionReader {
    path: PathBuf,
    reference_year: i32,
    require_labels: bool,
}

/// Header positions of the columns the reader consumes.
struct ColumnMap {
    required: [usize; REQUIRED_COLUMNS.len()],
    label: Option<usize>,
    id: Option<usize>,
}

impl TransactionReader {
    /// Create a labelled reader for the given file, measuring ages against
    /// the current UTC year.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            reference_year: time::OffsetDateTime::now_utc().year(),
            require_labels: true,
        }
    }

    /// Pin the year ages are measured against.
    #[must_use]
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    /// Accept files without an `is_fraud` column. Labels are still read when
    /// the column is present.
    #[must_use]
    pub fn unlabelled(mut self) -> Self {
        self.require_labels = false;
        self
    }

    /// Read and validate the file, returning a [`TransactionDataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<TransactionDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets our own InconsistentRowLength check fire instead
        // of a low-level parse error.
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'|')
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.parse_error(e))?.clone();
        let expected_cols = header.len();
        let columns = self.column_map(&header)?;
        debug!(
            expected_cols,
            labelled = columns.label.is_some(),
            with_ids = columns.id.is_some(),
            "read header"
        );

        let mut rows = Vec::new();
        let mut labels = columns.label.map(|_| Vec::new());
        let mut ids = columns.id.map(|_| Vec::new());

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.parse_error(e))?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let transaction = self.parse_transaction(&record, &columns.required, row_index)?;
            rows.push(transaction.features(self.reference_year));

            if let (Some(col), Some(labels)) = (columns.label, labels.as_mut()) {
                labels.push(self.parse_label(&record[col], row_index)?);
            }
            if let (Some(col), Some(ids)) = (columns.id, ids.as_mut()) {
                ids.push(record[col].to_string());
            }
        }

        if rows.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let dataset = TransactionDataset::new(rows, labels, ids, self.reference_year);
        info!(
            n_samples = dataset.n_samples(),
            n_fraud = dataset.n_fraud(),
            reference_year = self.reference_year,
            "transaction dataset loaded"
        );
        Ok(dataset)
    }

    fn column_map(&self, header: &csv::StringRecord) -> Result<ColumnMap, IoError> {
        let position = |name: &str| header.iter().position(|h| h == name);

        let mut required = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, &name) in required.iter_mut().zip(&REQUIRED_COLUMNS) {
            *slot = position(name).ok_or_else(|| IoError::MissingColumn {
                path: self.path.clone(),
                column: name,
            })?;
        }

        let label = position(LABEL_COLUMN);
        if label.is_none() && self.require_labels {
            return Err(IoError::MissingColumn {
                path: self.path.clone(),
                column: LABEL_COLUMN,
            });
        }

        Ok(ColumnMap {
            required,
            label,
            id: position(ID_COLUMN),
        })
    }

    fn parse_transaction(
        &self,
        record: &csv::StringRecord,
        required: &[usize; REQUIRED_COLUMNS.len()],
        row_index: usize,
    ) -> Result<Transaction, IoError> {
        let cell = |i: usize| &record[required[i]];

        let dob = cell(5);
        let birth_year = birth_year(dob).ok_or_else(|| self.invalid(row_index, 5, dob))?;

        Ok(Transaction {
            lat: self.parse_finite(cell(0), row_index, 0)?,
            long: self.parse_finite(cell(1), row_index, 1)?,
            merch_lat: self.parse_finite(cell(2), row_index, 2)?,
            merch_long: self.parse_finite(cell(3), row_index, 3)?,
            gender: cell(4).to_string(),
            birth_year,
            unix_time: self.parse(cell(6), row_index, 6)?,
            category: cell(7).to_string(),
            amount: self.parse_finite(cell(8), row_index, 8)?,
        })
    }

    fn parse<T: FromStr>(&self, raw: &str, row_index: usize, column: usize) -> Result<T, IoError> {
        raw.parse().map_err(|_| self.invalid(row_index, column, raw))
    }

    fn parse_finite(&self, raw: &str, row_index: usize, column: usize) -> Result<f64, IoError> {
        let value: f64 = self.parse(raw, row_index, column)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(self.invalid(row_index, column, raw))
        }
    }

    fn parse_label(&self, raw: &str, row_index: usize) -> Result<usize, IoError> {
        match raw {
            "0" => Ok(0),
            "1" => Ok(1),
            _ => Err(IoError::InvalidLabel {
                path: self.path.clone(),
                row_index,
                raw: raw.to_string(),
            }),
        }
    }

    fn invalid(&self, row_index: usize, column: usize, raw: &str) -> IoError {
        IoError::InvalidValue {
            path: self.path.clone(),
            row_index,
            column: REQUIRED_COLUMNS[column],
            raw: raw.to_string(),
        }
    }

    fn parse_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
