//! CSV persistence for the training dataset

use std::path::{Path, PathBuf};

use thiserror::Error;

use shared::{TrainingExample, DATASET_COLUMNS};

use crate::ml::artifacts::write_atomically;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Dataset I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Dataset {path} is malformed: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

/// Read every row of the dataset. A missing file is an empty dataset.
pub fn load_dataset(path: &Path) -> Result<Vec<TrainingExample>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| StoreError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    reader
        .deserialize::<TrainingExample>()
        .map(|row| {
            row.map_err(|source| StoreError::Csv {
                path: path.to_path_buf(),
                source,
            })
        })
        .collect()
}

/// Rewrite the whole dataset, header first, replacing the file atomically
pub fn write_dataset(path: &Path, rows: &[TrainingExample]) -> Result<(), StoreError> {
    let csv_error = |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    wtr.write_record(DATASET_COLUMNS).map_err(csv_error)?;
    for row in rows {
        wtr.serialize(row).map_err(csv_error)?;
    }
    let bytes = wtr.into_inner().map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e.into_error(),
    })?;

    write_atomically(path, &bytes).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}
