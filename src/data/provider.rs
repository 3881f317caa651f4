//! Training table provider backed by CSV files
//!
//! Loads the table with polars when it exists, otherwise synthesizes the
//! reference dataset and persists it for the next run. Failures degrade to
//! in-memory synthesis and are only logged.

use crate::data::record::{
    CategoricalColumn, FeatureColumn, LoanRecord, LoanStatus, NumericColumn, FEATURE_COLUMNS,
    LABEL_COLUMN,
};
use crate::data::synthetic::SyntheticLoanGenerator;
use crate::error::{LoanError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Where a provided table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Loaded,
    Synthesized { persisted: bool },
}

/// Rows handed to the trainer, tagged with their origin
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub rows: Vec<LoanRecord>,
    pub origin: DataOrigin,
}

/// Dataset provider
#[derive(Debug, Clone)]
pub struct DatasetProvider {
    generator: SyntheticLoanGenerator,
}

impl DatasetProvider {
    pub fn new(sample_size: usize, seed: u64) -> Self {
        Self {
            generator: SyntheticLoanGenerator::new(sample_size).with_seed(seed),
        }
    }

    /// Load the table at `path`, or synthesize one and try to persist it
    pub fn load_or_create(&self, path: &Path) -> LoadedDataset {
        if path.exists() {
            return match read_loan_csv(path) {
                Ok(rows) => {
                    info!(path = %path.display(), rows = rows.len(), "Loaded training table");
                    LoadedDataset {
                        rows,
                        origin: DataOrigin::Loaded,
                    }
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Training table unreadable, using synthetic data");
                    self.in_memory()
                }
            };
        }

        let Ok(rows) = self.generator.generate() else {
            return self.in_memory();
        };
        let persisted = match write_loan_csv(path, &rows) {
            Ok(()) => {
                info!(path = %path.display(), rows = rows.len(), "Created synthetic training table");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not persist synthetic table");
                false
            }
        };
        LoadedDataset {
            rows,
            origin: DataOrigin::Synthesized { persisted },
        }
    }

    /// Synthesized rows that are never written out. Empty when synthesis
    /// itself fails, which the trainer then reports as empty data.
    fn in_memory(&self) -> LoadedDataset {
        let rows = self.generator.generate().unwrap_or_else(|e| {
            error!(error = %e, "Could not synthesize training table");
            Vec::new()
        });
        LoadedDataset {
            rows,
            origin: DataOrigin::Synthesized { persisted: false },
        }
    }
}

/// Read a loan table. Every feature column and the label column must exist.
pub fn read_loan_csv(path: &Path) -> Result<Vec<LoanRecord>> {
    let file = File::open(path)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_schema_overwrite(Some(Arc::new(loan_schema())))
        .into_reader_with_file_handle(file)
        .finish()?;
    frame_to_records(&df)
}

/// Column types for a loan table, so no late value can contradict a guess
fn loan_schema() -> Schema {
    let mut schema = Schema::with_capacity(FEATURE_COLUMNS.len() + 1);
    for column in CategoricalColumn::ALL {
        schema.insert(column.name().into(), DataType::String);
    }
    for column in NumericColumn::ALL {
        schema.insert(column.name().into(), DataType::Float64);
    }
    schema.insert(LABEL_COLUMN.into(), DataType::String);
    schema
}

/// Write a loan table through a temporary sibling file renamed into place
pub fn write_loan_csv(path: &Path, rows: &[LoanRecord]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut df = records_to_frame(rows)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    CsvWriter::new(&mut tmp)
        .include_header(true)
        .finish(&mut df)?;
    tmp.persist(path)?;
    Ok(())
}

/// Build a DataFrame in canonical column order, label last
pub fn records_to_frame(rows: &[LoanRecord]) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(FEATURE_COLUMNS.len() + 1);
    for column in FEATURE_COLUMNS {
        let name: PlSmallStr = column.name().into();
        let col = match column {
            FeatureColumn::Categorical(c) => {
                let values: Vec<Option<&str>> = rows.iter().map(|r| r.categorical(c)).collect();
                Column::new(name, values)
            }
            FeatureColumn::Numeric(n) if n.is_integer() => {
                let values: Vec<Option<i64>> =
                    rows.iter().map(|r| r.numeric(n).map(|v| v as i64)).collect();
                Column::new(name, values)
            }
            FeatureColumn::Numeric(n) => {
                let values: Vec<Option<f64>> = rows.iter().map(|r| r.numeric(n)).collect();
                Column::new(name, values)
            }
        };
        columns.push(col);
    }
    let labels: Vec<Option<i64>> = rows
        .iter()
        .map(|r| r.loan_status.map(|s| i64::from(s.code())))
        .collect();
    columns.push(Column::new(LABEL_COLUMN.into(), labels));

    Ok(DataFrame::new(columns)?)
}

/// Convert a DataFrame into records, treating a missing column as corruption
pub fn frame_to_records(df: &DataFrame) -> Result<Vec<LoanRecord>> {
    let mut rows = vec![LoanRecord::default(); df.height()];

    for column in CategoricalColumn::ALL {
        for (row, value) in rows.iter_mut().zip(string_column(df, column.name())?) {
            if let Some(value) = value {
                row.set_categorical(column, value);
            }
        }
    }
    for column in NumericColumn::ALL {
        for (row, value) in rows.iter_mut().zip(float_column(df, column.name())?) {
            if let Some(value) = value.filter(|v| !column.is_integer() || *v >= 0.0) {
                row.set_numeric(column, value);
            }
        }
    }
    for (row, value) in rows.iter_mut().zip(string_column(df, LABEL_COLUMN)?) {
        row.loan_status = value.as_deref().and_then(LoanStatus::parse);
    }

    Ok(rows)
}

fn required_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| LoanError::DataError(format!("Missing required column: {}", name)))
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = required_column(df, name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect();
    Ok(values)
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = required_column(df, name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let values = series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_and_persists_when_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loan_data.csv");
        let provider = DatasetProvider::new(40, 42);

        let first = provider.load_or_create(&path);
        assert_eq!(first.origin, DataOrigin::Synthesized { persisted: true });
        assert_eq!(first.rows.len(), 40);
        assert!(path.exists());

        let second = provider.load_or_create(&path);
        assert_eq!(second.origin, DataOrigin::Loaded);
        assert_eq!(second.rows.len(), 40);
        assert_eq!(second.rows[0].gender, first.rows[0].gender);
        assert_eq!(second.rows[0].loan_status, first.rows[0].loan_status);
        assert_eq!(second.rows[0].loan_amount_term, first.rows[0].loan_amount_term);
    }

    #[test]
    fn test_empty_cells_load_as_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loans.csv");
        std::fs::write(
            &path,
            "Gender,Married,Dependents,Education,Self_Employed,ApplicantIncome,CoapplicantIncome,LoanAmount,Loan_Amount_Term,Credit_History,Property_Area,Loan_Status\n\
             Male,Yes,0,Graduate,No,5000,0,150,360,1,Urban,1\n\
             ,No,3+,Not Graduate,,,1200,,,0,Rural,0\n",
        )
        .unwrap();

        let rows = read_loan_csv(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].loan_amount_term, Some(360));
        assert_eq!(rows[0].loan_status, Some(LoanStatus::Approved));
        assert!(rows[1].gender.is_none());
        assert!(rows[1].self_employed.is_none());
        assert!(rows[1].applicant_income.is_none());
        assert!(rows[1].loan_amount.is_none());
        assert_eq!(rows[1].dependents.as_deref(), Some("3+"));
        assert_eq!(rows[1].credit_history, Some(0));
    }

    #[test]
    fn test_missing_column_falls_back_without_persisting() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(&path, "Gender,Married\nMale,Yes\n").unwrap();

        assert!(read_loan_csv(&path).is_err());

        let dataset = DatasetProvider::new(25, 42).load_or_create(&path);
        assert_eq!(dataset.origin, DataOrigin::Synthesized { persisted: false });
        assert_eq!(dataset.rows.len(), 25);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "Gender,Married\nMale,Yes\n");
    }

    #[test]
    fn test_unwritable_location_still_returns_rows() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "x").unwrap();
        let path = blocker.join("loan_data.csv");

        let dataset = DatasetProvider::new(10, 1).load_or_create(&path);
        assert_eq!(dataset.origin, DataOrigin::Synthesized { persisted: false });
        assert_eq!(dataset.rows.len(), 10);
    }

    const HEADER: &str = "Gender,Married,Dependents,Education,Self_Employed,ApplicantIncome,\
CoapplicantIncome,LoanAmount,Loan_Amount_Term,Credit_History,Property_Area,Loan_Status\n";

    fn integer_rows(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| {
                format!(
                    "Male,Yes,{},Graduate,No,{},0,150,360,1,Urban,{}",
                    i % 3,
                    4000 + i,
                    i % 2
                )
            })
            .collect()
    }

    fn write_table(path: &Path, rows: &[String]) {
        let mut contents = HEADER.to_string();
        for row in rows {
            contents.push_str(row);
            contents.push('\n');
        }
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_late_open_ended_dependents_still_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loan_data.csv");
        let mut rows = integer_rows(150);
        rows[119] = "Female,No,3+,Graduate,No,4200,0,120,360,1,Rural,0".to_string();
        write_table(&path, &rows);

        let dataset = DatasetProvider::new(25, 42).load_or_create(&path);
        assert_eq!(dataset.origin, DataOrigin::Loaded);
        assert_eq!(dataset.rows.len(), 150);
        assert_eq!(dataset.rows[119].dependents.as_deref(), Some("3+"));
        assert_eq!(dataset.rows[0].dependents.as_deref(), Some("0"));
        assert_eq!(dataset.rows[1].loan_status, Some(LoanStatus::Approved));
    }

    #[test]
    fn test_late_fractional_income_still_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loan_data.csv");
        let mut rows = integer_rows(150);
        rows[129] = "Male,Yes,1,Graduate,No,5000.5,0,150,360,1,Urban,1".to_string();
        write_table(&path, &rows);

        let dataset = DatasetProvider::new(25, 42).load_or_create(&path);
        assert_eq!(dataset.origin, DataOrigin::Loaded);
        assert_eq!(dataset.rows.len(), 150);
        assert_eq!(dataset.rows[129].applicant_income, Some(5000.5));
        assert_eq!(dataset.rows[0].applicant_income, Some(4000.0));
    }
}
