//! Model training
//!
//! - CART decision trees and a bootstrap Random Forest
//! - Logistic regression by gradient descent
//! - Training engine with stratified split and best-candidate selection

mod config;
mod engine;
mod models;
pub mod decision_tree;
pub mod linear_models;
pub mod random_forest;

pub use config::TrainerConfig;
pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::{stratified_split, ModelTrainer, TrainingOutcome};
pub use linear_models::LogisticRegression;
pub use models::{accuracy, CandidateScore, Classifier, TrainingMetrics};
pub use random_forest::{MaxFeatures, RandomForest};
