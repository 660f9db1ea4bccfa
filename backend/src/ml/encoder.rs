//! Ordinal encoder for the categorical feature columns

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared::TrainingExample;

/// Categorical columns in feature order
pub const CATEGORICAL_COLUMNS: [&str; 4] = ["crop_name", "location", "weather", "soiltype"];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncoderError {
    #[error("Encoder has no known categories for column {0}")]
    EmptyColumn(String),

    #[error("Encoder expects {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },
}

/// Known categories of one column, sorted ascending
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryColumn {
    pub name: String,
    pub categories: Vec<String>,
}

impl CategoryColumn {
    fn code_of(&self, value: &str) -> Result<usize, EncoderError> {
        if self.categories.is_empty() {
            return Err(EncoderError::EmptyColumn(self.name.clone()));
        }
        // Unseen values take the first known category
        Ok(self
            .categories
            .binary_search_by(|known| known.as_str().cmp(value))
            .unwrap_or(0))
    }
}

/// Maps raw categorical values to their ordinal codes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoricalEncoder {
    columns: Vec<CategoryColumn>,
}

impl CategoricalEncoder {
    /// Learn sorted category sets from a dataset
    pub fn fit(rows: &[TrainingExample]) -> Self {
        let mut sets: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); CATEGORICAL_COLUMNS.len()];
        for row in rows {
            for (set, value) in sets.iter_mut().zip(row.categorical()) {
                set.insert(value);
            }
        }

        let columns = CATEGORICAL_COLUMNS
            .iter()
            .zip(sets)
            .map(|(name, set)| CategoryColumn {
                name: name.to_string(),
                categories: set.into_iter().map(str::to_string).collect(),
            })
            .collect();

        Self { columns }
    }

    /// Build an encoder from explicit category lists (sorted on the way in)
    pub fn from_columns(columns: Vec<CategoryColumn>) -> Result<Self, EncoderError> {
        if columns.len() != CATEGORICAL_COLUMNS.len() {
            return Err(EncoderError::ColumnCount {
                expected: CATEGORICAL_COLUMNS.len(),
                found: columns.len(),
            });
        }
        let columns = columns
            .into_iter()
            .map(|mut column| {
                column.categories.sort();
                column.categories.dedup();
                column
            })
            .collect();
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[CategoryColumn] {
        &self.columns
    }

    /// Encode crop, location, weather and soil type.
    ///
    /// Never fails for out-of-vocabulary input: an unseen value is replaced
    /// by its column's first known category. Fails only when a column has
    /// no categories at all.
    pub fn encode(
        &self,
        crop: &str,
        location: &str,
        weather: &str,
        soil: &str,
    ) -> Result<[f64; 4], EncoderError> {
        if self.columns.len() != CATEGORICAL_COLUMNS.len() {
            return Err(EncoderError::ColumnCount {
                expected: CATEGORICAL_COLUMNS.len(),
                found: self.columns.len(),
            });
        }

        let values = [crop, location, weather, soil];
        let mut encoded = [0.0; 4];
        for ((slot, column), value) in encoded.iter_mut().zip(&self.columns).zip(values) {
            *slot = column.code_of(value)? as f64;
        }
        Ok(encoded)
    }

    /// Full feature vector: encoded categoricals followed by the numeric columns
    pub fn feature_row(&self, example: &TrainingExample) -> Result<Vec<f64>, EncoderError> {
        let [crop, location, weather, soil] = example.categorical();
        let mut row = self.encode(crop, location, weather, soil)?.to_vec();
        row.extend(example.numeric());
        Ok(row)
    }
}
