//! Missing value imputation for loan records

use crate::data::{CategoricalColumn, LoanRecord, NumericColumn};
use crate::error::{LoanError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fill value learned for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeValue {
    Numeric(f64),
    Text(String),
}

/// Imputer filling numeric columns with the median and categorical columns
/// with the most frequent value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Imputer {
    fill_values: HashMap<String, ImputeValue>,
    is_fitted: bool,
}

impl Imputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn fill values from the rows. Columns without any present value
    /// get no fill value.
    pub fn fit(&mut self, rows: &[LoanRecord]) -> &mut Self {
        self.fill_values.clear();
        for column in NumericColumn::ALL {
            if let Some(median) = column_median(rows, column) {
                let median = if column.is_integer() { median.round() } else { median };
                self.fill_values
                    .insert(column.name().to_string(), ImputeValue::Numeric(median));
            }
        }
        for column in CategoricalColumn::ALL {
            if let Some(mode) = column_mode(rows, column) {
                self.fill_values
                    .insert(column.name().to_string(), ImputeValue::Text(mode));
            }
        }
        self.is_fitted = true;
        self
    }

    /// Fill missing values in a copy of the rows
    pub fn transform(&self, rows: &[LoanRecord]) -> Result<Vec<LoanRecord>> {
        if !self.is_fitted {
            return Err(LoanError::ModelNotFitted);
        }

        let mut filled = rows.to_vec();
        for column in NumericColumn::ALL {
            let Some(ImputeValue::Numeric(value)) = self.fill_values.get(column.name()) else {
                continue;
            };
            for row in filled.iter_mut().filter(|r| r.numeric(column).is_none()) {
                row.set_numeric(column, *value);
            }
        }
        for column in CategoricalColumn::ALL {
            let Some(ImputeValue::Text(value)) = self.fill_values.get(column.name()) else {
                continue;
            };
            for row in filled.iter_mut().filter(|r| r.categorical(column).is_none()) {
                row.set_categorical(column, value.clone());
            }
        }
        Ok(filled)
    }

    pub fn fill_value(&self, column: &str) -> Option<&ImputeValue> {
        self.fill_values.get(column)
    }
}

/// Impute missing values using statistics of the given rows only.
///
/// Works the same for a single serving row as for a full training table.
/// The input is never modified.
pub fn clean(rows: &[LoanRecord]) -> Vec<LoanRecord> {
    let mut imputer = Imputer::new();
    imputer.fit(rows);
    // fit was just called, so transform cannot report ModelNotFitted
    imputer.transform(rows).unwrap_or_else(|_| rows.to_vec())
}

/// Median of the present values; even counts average the two middle values
pub fn column_median(rows: &[LoanRecord], column: NumericColumn) -> Option<f64> {
    let mut values: Vec<f64> = rows
        .iter()
        .filter_map(|r| r.numeric(column))
        .filter(|v| !v.is_nan())
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Most frequent present value; ties go to the first one encountered
pub fn column_mode(rows: &[LoanRecord], column: CategoricalColumn) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for value in rows.iter().filter_map(|r| r.categorical(column)) {
        let count = counts.entry(value).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for value in order {
        let count = counts[value];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_string())
}
