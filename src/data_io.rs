//! CSV I/O for the prediction run.
//!
//! The input table is kept as raw string records so the output can copy it
//! verbatim; only the SMILES column is interpreted.
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use csv::StringRecord;
use thiserror::Error;

use crate::config::{PIC50_COLUMN, PREDICTION_COLUMN};

/// Table I/O failures.
#[derive(Debug, Error)]
pub enum DataError {
    /// The CSV could not be read or written.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },

    /// A required column is missing.
    #[error("input CSV must contain '{0}' column")]
    MissingColumn(String),

    /// Predictions and rows do not line up.
    #[error("{predictions} predictions for {rows} rows")]
    RowMismatch {
        /// Rows in the table.
        rows: usize,
        /// Predictions supplied.
        predictions: usize,
    },
}

/// An input table held as raw records.
#[derive(Debug, Clone)]
pub struct InputTable {
    headers: StringRecord,
    records: Vec<StringRecord>,
    smiles_idx: usize,
}

impl InputTable {
    /// Column names.
    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// SMILES strings in row order; a missing field reads as empty.
    pub fn smiles(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.get(self.smiles_idx).unwrap_or("").to_string())
            .collect()
    }
}

/// Read a CSV table that must contain `smiles_column`.
///
/// ```no_run
/// use qsar_predict::data_io::read_smiles_table;
///
/// let table = read_smiles_table("molecules.csv", "SMILES")?;
/// println!("{} molecules", table.len());
/// # Ok::<(), qsar_predict::data_io::DataError>(())
/// ```
pub fn read_smiles_table<P: AsRef<Path>>(path: P, smiles_column: &str) -> Result<InputTable, DataError> {
    let path = path.as_ref();
    let wrap = |source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(wrap)?;
    read_table(rdr, smiles_column).map_err(|e| match e {
        TableError::Csv(source) => wrap(source),
        TableError::Data(d) => d,
    })
}

/// Same as [`read_smiles_table`] from any reader (useful for tests and in-memory data).
pub fn read_smiles_table_from_reader(
    reader: impl Read,
    smiles_column: &str,
) -> Result<InputTable, DataError> {
    let rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    read_table(rdr, smiles_column).map_err(|e| match e {
        TableError::Csv(source) => DataError::Csv {
            path: PathBuf::from("<reader>"),
            source,
        },
        TableError::Data(d) => d,
    })
}

enum TableError {
    Csv(csv::Error),
    Data(DataError),
}

fn read_table<R: Read>(mut rdr: csv::Reader<R>, smiles_column: &str) -> Result<InputTable, TableError> {
    let headers = rdr.headers().map_err(TableError::Csv)?.clone();
    let smiles_idx = headers
        .iter()
        .position(|h| h == smiles_column)
        .ok_or_else(|| TableError::Data(DataError::MissingColumn(smiles_column.to_string())))?;
    let records = rdr
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(TableError::Csv)?;
    Ok(InputTable {
        headers,
        records,
        smiles_idx,
    })
}

/// Write the input table plus the two prediction columns to `writer`.
pub fn write_predictions_to_writer(
    writer: impl Write,
    table: &InputTable,
    predictions: &[f64],
) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    let mut header = table.headers.clone();
    header.push_field(PREDICTION_COLUMN);
    header.push_field(PIC50_COLUMN);
    wtr.write_record(&header)?;
    for (record, value) in table.records.iter().zip(predictions) {
        let mut row = record.clone();
        let text = format!("{value:?}");
        row.push_field(&text);
        row.push_field(&text);
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the input table plus predictions to `path`.
pub fn write_predictions<P: AsRef<Path>>(
    path: P,
    table: &InputTable,
    predictions: &[f64],
) -> Result<(), DataError> {
    let path = path.as_ref();
    if predictions.len() != table.len() {
        return Err(DataError::RowMismatch {
            rows: table.len(),
            predictions: predictions.len(),
        });
    }
    let file = std::fs::File::create(path).map_err(|e| DataError::Csv {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    write_predictions_to_writer(file, table, predictions).map_err(|source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    })
}
