//! Training configuration

use crate::error::{LoanError, Result};
use serde::{Deserialize, Serialize};

/// Settings for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Share of each class held out for evaluation
    pub test_ratio: f64,
    pub random_seed: u64,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub lr_max_iter: usize,
    pub lr_learning_rate: f64,
    pub lr_alpha: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            random_seed: 42,
            n_estimators: 100,
            max_depth: None,
            lr_max_iter: 1000,
            lr_learning_rate: 0.1,
            lr_alpha: 0.0001,
        }
    }
}

impl TrainerConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_test_ratio(mut self, ratio: f64) -> Self {
        self.test_ratio = ratio;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(LoanError::ConfigError(format!(
                "test_ratio must be in (0, 1), got {}",
                self.test_ratio
            )));
        }
        if self.n_estimators == 0 {
            return Err(LoanError::ConfigError("n_estimators must be positive".to_string()));
        }
        if self.lr_learning_rate <= 0.0 {
            return Err(LoanError::ConfigError("learning rate must be positive".to_string()));
        }
        Ok(())
    }
}
