//! Model training engine
//!
//! Loads or synthesizes the loan table, cleans and encodes it, splits it per
//! class, scales on the training split, fits the candidate classifiers and
//! keeps the most accurate one in a [`TrainedBundle`].

use super::config::TrainerConfig;
use super::linear_models::LogisticRegression;
use super::models::{accuracy, CandidateScore, Classifier, TrainingMetrics};
use super::random_forest::{MaxFeatures, RandomForest};
use crate::data::{DataOrigin, DatasetProvider, FeatureColumn, LoanRecord, FEATURE_COLUMNS};
use crate::error::{LoanError, Result};
use crate::export::ModelStore;
use crate::inference::TrainedBundle;
use crate::preprocessing::{clean, FeatureEncoder, StandardScaler};
use chrono::Utc;
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of a full training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub bundle: TrainedBundle,
    pub origin: DataOrigin,
}

impl TrainingOutcome {
    pub fn metrics(&self) -> &TrainingMetrics {
        &self.bundle.metrics
    }
}

/// Trains candidate classifiers and selects the best one
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    config: TrainerConfig,
    provider: DatasetProvider,
}

impl ModelTrainer {
    pub fn new(config: TrainerConfig, provider: DatasetProvider) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Load the table at `data_path`, train, and persist the bundle
    pub fn train(&self, data_path: &Path, store: &ModelStore) -> Result<TrainingOutcome> {
        let dataset = self.provider.load_or_create(data_path);
        let bundle = self.fit_rows(&dataset.rows)?;
        store.save(&bundle)?;
        info!(
            model = %bundle.metrics.model_name,
            accuracy = bundle.metrics.accuracy,
            path = %store.path().display(),
            "Model trained and saved"
        );
        Ok(TrainingOutcome {
            bundle,
            origin: dataset.origin,
        })
    }

    /// Train on in-memory rows without touching the filesystem
    pub fn fit_rows(&self, rows: &[LoanRecord]) -> Result<TrainedBundle> {
        self.config.validate()?;
        let start = Instant::now();

        let labeled: Vec<LoanRecord> = rows
            .iter()
            .filter(|r| r.loan_status.is_some())
            .cloned()
            .collect();
        let dropped = rows.len() - labeled.len();
        if dropped > 0 {
            warn!(dropped, "Dropped rows without a Loan_Status label");
        }
        if labeled.len() < 2 {
            return Err(LoanError::TrainingError(format!(
                "Need at least 2 labeled rows, got {}",
                labeled.len()
            )));
        }

        let cleaned = clean(&labeled);
        let (encoder, x) = FeatureEncoder::fit_transform(&cleaned, &FEATURE_COLUMNS)?;
        let y: Array1<f64> = cleaned
            .iter()
            .map(|r| r.loan_status.map_or(0.0, |s| f64::from(s.code())))
            .collect();

        let (train_idx, test_idx) =
            stratified_split(&y, self.config.test_ratio, self.config.random_seed)?;
        let x_train = x.select(Axis(0), &train_idx);
        let x_test = x.select(Axis(0), &test_idx);
        let y_train = y.select(Axis(0), &train_idx);
        let y_test = y.select(Axis(0), &test_idx);

        let mut scaler = StandardScaler::new();
        let x_train = scaler.fit_transform(&x_train)?;
        let x_test = scaler.transform(&x_test)?;

        debug!(
            train = train_idx.len(),
            test = test_idx.len(),
            features = x.ncols(),
            "Prepared training matrices"
        );

        let mut scores = Vec::new();
        let mut best: Option<(Classifier, f64)> = None;
        for candidate in self.fit_candidates(&x_train, &y_train)? {
            let predictions = candidate.predict(&x_test)?;
            let score = accuracy(&y_test, &predictions);
            info!(model = candidate.name(), accuracy = score, "Candidate evaluated");
            scores.push(CandidateScore {
                model_name: candidate.name().to_string(),
                accuracy: score,
            });
            if best.as_ref().map_or(true, |(_, b)| score > *b) {
                best = Some((candidate, score));
            }
        }
        let (classifier, best_accuracy) =
            best.ok_or_else(|| LoanError::TrainingError("No candidate model trained".to_string()))?;

        let metrics = TrainingMetrics {
            model_name: classifier.name().to_string(),
            accuracy: best_accuracy,
            training_samples: train_idx.len(),
            test_samples: test_idx.len(),
            candidates: scores,
            trained_at: Utc::now(),
        };
        info!(
            model = %metrics.model_name,
            accuracy = metrics.accuracy,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Selected best model"
        );

        Ok(TrainedBundle {
            classifier,
            scaler,
            encoder,
            feature_columns: FEATURE_COLUMNS.iter().map(|c| c.name().to_string()).collect(),
            categorical_columns: FEATURE_COLUMNS
                .iter()
                .filter(|c| matches!(c, FeatureColumn::Categorical(_)))
                .map(|c| c.name().to_string())
                .collect(),
            metrics,
        })
    }

    /// Candidates in training order: forest first, then logistic regression
    fn fit_candidates(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<Vec<Classifier>> {
        let mut forest = RandomForest::new(self.config.n_estimators)
            .with_max_depth(self.config.max_depth)
            .with_max_features(MaxFeatures::Sqrt)
            .with_random_state(self.config.random_seed);
        forest.fit(x, y)?;

        let mut logistic = LogisticRegression::new()
            .with_max_iter(self.config.lr_max_iter)
            .with_learning_rate(self.config.lr_learning_rate)
            .with_alpha(self.config.lr_alpha);
        logistic.fit(x, y)?;

        Ok(vec![
            Classifier::RandomForest(forest),
            Classifier::LogisticRegression(logistic),
        ])
    }
}

/// Per-class shuffled split. Each class with at least two rows contributes
/// `round(n * test_ratio)` rows to the test side, clamped to `[1, n - 1]`.
pub fn stratified_split(
    y: &Array1<f64>,
    test_ratio: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        class_indices.entry(label.round() as i64).or_default().push(i);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train_indices = Vec::new();
    let mut test_indices = Vec::new();

    for indices in class_indices.values_mut() {
        indices.shuffle(&mut rng);
        let n = indices.len();
        let n_test = if n < 2 {
            0
        } else {
            ((n as f64 * test_ratio).round() as usize).clamp(1, n - 1)
        };
        test_indices.extend_from_slice(&indices[..n_test]);
        train_indices.extend_from_slice(&indices[n_test..]);
    }

    if train_indices.is_empty() || test_indices.is_empty() {
        return Err(LoanError::DataError(
            "Stratified split resulted in empty train or test set".to_string(),
        ));
    }

    train_indices.sort_unstable();
    test_indices.sort_unstable();
    Ok((train_indices, test_indices))
}
