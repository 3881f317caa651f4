//! Serving: trained bundles, prediction outcomes and the model service

mod bundle;
mod service;

pub use bundle::TrainedBundle;
pub use service::{BundleState, ModelService};

use crate::data::LoanStatus;
use crate::preprocessing::EncodeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A served prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub status: LoanStatus,
    /// Probability mass of the predicted class
    pub confidence: f64,
}

impl Prediction {
    pub fn label(&self) -> u8 {
        self.status.code()
    }
}

/// Why no prediction could be served
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Unavailable {
    #[error("no trained model is available")]
    NoModel,

    #[error("encoding failed: {0}")]
    Encoding(#[from] EncodeError),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Result of a prediction request
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    Ready(Prediction),
    Unavailable(Unavailable),
}

impl PredictionOutcome {
    /// `(label, confidence)`, or `(None, 0.0)` when unavailable
    pub fn as_pair(&self) -> (Option<u8>, f64) {
        match self {
            PredictionOutcome::Ready(p) => (Some(p.label()), p.confidence),
            PredictionOutcome::Unavailable(_) => (None, 0.0),
        }
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            PredictionOutcome::Ready(p) => Some(p),
            PredictionOutcome::Unavailable(_) => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PredictionOutcome::Ready(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_pair() {
        let ready = PredictionOutcome::Ready(Prediction {
            status: LoanStatus::Approved,
            confidence: 0.8,
        });
        assert_eq!(ready.as_pair(), (Some(1), 0.8));
        assert!(ready.is_ready());

        let missing = PredictionOutcome::Unavailable(Unavailable::NoModel);
        assert_eq!(missing.as_pair(), (None, 0.0));
        assert!(missing.prediction().is_none());
    }

    #[test]
    fn test_unavailable_from_encode_error() {
        let reason: Unavailable = EncodeError::MissingEncoder("Married".to_string()).into();
        assert_eq!(reason.to_string(), "encoding failed: no encoder fitted for column Married");
    }
}
