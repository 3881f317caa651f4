//! Loan Approval - loan approval prediction service
//!
//! This crate provides the full lifecycle of a loan approval classifier:
//! - Loading or synthesizing the training table
//! - Imputation, categorical encoding and scaling with train/serve consistency
//! - Training candidate classifiers and keeping the best by held-out accuracy
//! - A versioned on-disk artifact and a thread-safe serving handle
//! - Web server, prediction store and CLI
//!
//! # Modules
//!
//! ## Model lifecycle
//! - [`data`] - Loan records, synthetic data and the CSV dataset provider
//! - [`preprocessing`] - Imputation, label encoding, standard scaling
//! - [`training`] - Decision trees, Random Forest, logistic regression, trainer
//! - [`inference`] - Trained bundles and the model service
//! - [`export`] - Model artifact persistence
//!
//! ## Services
//! - [`server`] - HTTP server with web form and JSON API
//! - [`storage`] - SQLite prediction store
//! - [`cli`] - Command-line interface

// Core error handling and configuration
pub mod error;
pub mod config;

// Model lifecycle
pub mod data;
pub mod preprocessing;
pub mod training;
pub mod inference;
pub mod export;

// Services
pub mod storage;
pub mod server;
pub mod cli;

pub use error::{LoanError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{LoanError, Result};
    pub use crate::config::AppConfig;

    pub use crate::data::{DatasetProvider, LoanRecord, LoanStatus, SyntheticLoanGenerator};
    pub use crate::preprocessing::{FeatureEncoder, StandardScaler};
    pub use crate::training::{ModelTrainer, TrainerConfig, TrainingMetrics};
    pub use crate::inference::{ModelService, Prediction, PredictionOutcome, TrainedBundle};
    pub use crate::export::ModelStore;
    pub use crate::storage::PredictionStore;
}
