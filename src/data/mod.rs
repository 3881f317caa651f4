//! Loan records, the reference dataset, and the CSV-backed dataset provider

mod provider;
mod record;
mod synthetic;

pub use provider::{
    frame_to_records, read_loan_csv, records_to_frame, write_loan_csv, DataOrigin,
    DatasetProvider, LoadedDataset,
};
pub use record::{
    CategoricalColumn, FeatureColumn, LoanRecord, LoanStatus, NumericColumn, FEATURE_COLUMNS,
    LABEL_COLUMN,
};
pub use synthetic::SyntheticLoanGenerator;
