//! Persistent storage of served predictions

mod predictions;

pub use predictions::{NewPrediction, PredictionRecord, PredictionStore};
