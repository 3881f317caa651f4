//! Categorical label encoding with a fallback for unseen values

use crate::data::{CategoricalColumn, FeatureColumn, LoanRecord};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Reasons serve-time encoding can fail
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("no encoder fitted for column {0}")]
    MissingEncoder(String),

    #[error("encoder for column {0} has no known categories")]
    EmptyEncoder(String),

    #[error("missing value for column {column} in row {row}")]
    MissingValue { column: String, row: usize },

    #[error("unknown feature column {0}")]
    UnknownColumn(String),
}

/// Ordered mapping between the observed values of one column and codes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoding {
    classes: Vec<String>,
}

impl LabelEncoding {
    /// Fit on observed values; codes follow lexicographic order
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let classes: BTreeSet<&str> = values.into_iter().collect();
        Self {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Category substituted for unseen or missing values
    pub fn fallback(&self) -> Option<&str> {
        self.classes.first().map(String::as_str)
    }

    pub fn code(&self, value: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == value)
    }

    /// Code of `value`, or of the fallback when the value is unknown or absent
    pub fn code_or_fallback(&self, value: Option<&str>) -> Option<usize> {
        if self.classes.is_empty() {
            return None;
        }
        Some(value.and_then(|v| self.code(v)).unwrap_or(0))
    }
}

/// Per-column label encoders for the categorical features
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    encoders: HashMap<String, LabelEncoding>,
}

impl FeatureEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit fresh encoders for the categorical columns of `schema`, then
    /// encode the rows into a matrix in schema order.
    pub fn fit_transform(
        rows: &[LoanRecord],
        schema: &[FeatureColumn],
    ) -> Result<(Self, Array2<f64>), EncodeError> {
        let mut encoder = Self::new();
        for column in schema {
            if let FeatureColumn::Categorical(c) = column {
                let encoding = LabelEncoding::fit(rows.iter().filter_map(|r| r.categorical(*c)));
                encoder.encoders.insert(c.name().to_string(), encoding);
            }
        }
        let matrix = encoder.encode(rows, schema, false)?;
        Ok((encoder, matrix))
    }

    /// Encode with the fitted encoders. Unseen categorical values map to the
    /// column fallback; a column without a usable encoder is an error.
    pub fn transform(
        &self,
        rows: &[LoanRecord],
        schema: &[FeatureColumn],
    ) -> Result<Array2<f64>, EncodeError> {
        self.encode(rows, schema, true)
    }

    pub fn insert(&mut self, column: CategoricalColumn, encoding: LabelEncoding) {
        self.encoders.insert(column.name().to_string(), encoding);
    }

    pub fn get(&self, column: CategoricalColumn) -> Option<&LabelEncoding> {
        self.encoders.get(column.name())
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    fn encode(
        &self,
        rows: &[LoanRecord],
        schema: &[FeatureColumn],
        require_categories: bool,
    ) -> Result<Array2<f64>, EncodeError> {
        // resolve encoders once per column before touching rows
        let mut resolved: Vec<Option<&LabelEncoding>> = Vec::with_capacity(schema.len());
        for column in schema {
            match column {
                FeatureColumn::Categorical(c) => {
                    let encoding = self
                        .encoders
                        .get(c.name())
                        .ok_or_else(|| EncodeError::MissingEncoder(c.name().to_string()))?;
                    if require_categories && encoding.is_empty() {
                        return Err(EncodeError::EmptyEncoder(c.name().to_string()));
                    }
                    resolved.push(Some(encoding));
                }
                FeatureColumn::Numeric(_) => resolved.push(None),
            }
        }

        let mut matrix = Array2::zeros((rows.len(), schema.len()));
        for (i, row) in rows.iter().enumerate() {
            for (j, (column, encoding)) in schema.iter().zip(&resolved).enumerate() {
                let value = match (column, encoding) {
                    (FeatureColumn::Categorical(c), Some(encoding)) => encoding
                        .code_or_fallback(row.categorical(*c))
                        .map(|code| code as f64),
                    (FeatureColumn::Numeric(n), _) => row.numeric(*n),
                    (FeatureColumn::Categorical(_), None) => None,
                };
                matrix[[i, j]] = value.ok_or_else(|| EncodeError::MissingValue {
                    column: column.name().to_string(),
                    row: i,
                })?;
            }
        }
        Ok(matrix)
    }
}

/// Parse persisted column names back into feature columns
pub fn parse_schema(names: &[String]) -> Result<Vec<FeatureColumn>, EncodeError> {
    names
        .iter()
        .map(|name| {
            FeatureColumn::from_name(name).ok_or_else(|| EncodeError::UnknownColumn(name.clone()))
        })
        .collect()
}
