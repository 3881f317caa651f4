//! The trained bundle: everything needed to serve a prediction

use super::{Prediction, PredictionOutcome, Unavailable};
use crate::data::{FeatureColumn, LoanRecord, LoanStatus};
use crate::preprocessing::{clean, parse_schema, EncodeError, FeatureEncoder, StandardScaler};
use crate::training::decision_tree::argmax;
use crate::training::{Classifier, TrainingMetrics};
use serde::{Deserialize, Serialize};

/// Classifier, preprocessing state, column order and metrics of one
/// training run. Persisted and replaced as a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedBundle {
    pub classifier: Classifier,
    pub scaler: StandardScaler,
    pub encoder: FeatureEncoder,
    /// Model input order
    pub feature_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub metrics: TrainingMetrics,
}

impl TrainedBundle {
    /// Feature columns as typed identifiers
    pub fn feature_schema(&self) -> Result<Vec<FeatureColumn>, EncodeError> {
        for name in &self.categorical_columns {
            match FeatureColumn::from_name(name) {
                Some(FeatureColumn::Categorical(_)) => {}
                _ => return Err(EncodeError::UnknownColumn(name.clone())),
            }
        }
        parse_schema(&self.feature_columns)
    }

    /// Predict one applicant. Never fails; problems are reported through
    /// [`PredictionOutcome::Unavailable`].
    pub fn predict(&self, record: &LoanRecord) -> PredictionOutcome {
        match self.try_predict(record) {
            Ok(prediction) => PredictionOutcome::Ready(prediction),
            Err(reason) => PredictionOutcome::Unavailable(reason),
        }
    }

    fn try_predict(&self, record: &LoanRecord) -> Result<Prediction, Unavailable> {
        let schema = self.feature_schema()?;
        let cleaned = clean(std::slice::from_ref(record));
        let x = self.encoder.transform(&cleaned, &schema)?;
        let x = self
            .scaler
            .transform(&x)
            .map_err(|e| Unavailable::Inference(e.to_string()))?;
        let proba = self
            .classifier
            .predict_proba(&x)
            .map_err(|e| Unavailable::Inference(e.to_string()))?;

        let classes = self.classifier.classes();
        let row = proba.row(0);
        let best = argmax(&row);

        let confidence = row
            .get(best)
            .copied()
            .filter(|p| p.is_finite())
            .ok_or_else(|| Unavailable::Inference("classifier returned no probability".to_string()))?;
        let status = classes
            .get(best)
            .and_then(|&label| match label {
                l if l == 0.0 => Some(LoanStatus::NotApproved),
                l if l == 1.0 => Some(LoanStatus::Approved),
                _ => None,
            })
            .ok_or_else(|| Unavailable::Inference(format!("unexpected class index {}", best)))?;

        Ok(Prediction {
            status,
            confidence: confidence.clamp(0.0, 1.0),
        })
    }
}
