//! Data preprocessing
//!
//! - Missing value imputation (median for numeric, mode for categorical)
//! - Categorical label encoding with a fallback category
//! - Standard scaling of the assembled feature matrix

mod encoder;
mod imputer;
mod scaler;

pub use encoder::{parse_schema, EncodeError, FeatureEncoder, LabelEncoding};
pub use imputer::{clean, column_median, column_mode, ImputeValue, Imputer};
pub use scaler::{ScalerParams, StandardScaler};
