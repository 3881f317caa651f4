//! Candidate classifiers and training metrics

use super::decision_tree::argmax;
use super::linear_models::LogisticRegression;
use super::random_forest::RandomForest;
use crate::error::Result;
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A fitted candidate model. Class probability columns are `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Classifier {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
}

impl Classifier {
    pub fn name(&self) -> &'static str {
        match self {
            Classifier::RandomForest(_) => "RandomForest",
            Classifier::LogisticRegression(_) => "LogisticRegression",
        }
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        match self {
            Classifier::RandomForest(model) => model.predict_proba(x),
            Classifier::LogisticRegression(model) => model.predict_proba(x),
        }
    }

    /// Class labels the probability columns refer to
    pub fn classes(&self) -> Vec<f64> {
        match self {
            Classifier::RandomForest(model) => model.classes().to_vec(),
            Classifier::LogisticRegression(_) => vec![0.0, 1.0],
        }
    }

    /// Arg-max labels, the first class winning an exact tie
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        let classes = self.classes();
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| classes.get(argmax(&row)).copied().unwrap_or(0.0))
            .collect())
    }
}

/// Fraction of matching labels
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Held-out accuracy of one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub model_name: String,
    pub accuracy: f64,
}

/// Metrics recorded with a trained bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub model_name: String,
    pub accuracy: f64,
    pub training_samples: usize,
    pub test_samples: usize,
    /// Candidates in training order
    pub candidates: Vec<CandidateScore>,
    pub trained_at: DateTime<Utc>,
}
