//! Process-wide model handle
//!
//! Owns the current bundle behind a read-write lock. Predictions clone the
//! `Arc` and run without holding the lock; retraining builds a complete new
//! bundle, persists it, then swaps it in.

use super::{PredictionOutcome, TrainedBundle, Unavailable};
use crate::config::AppConfig;
use crate::data::{DatasetProvider, LoanRecord};
use crate::error::Result;
use crate::export::ModelStore;
use crate::training::{ModelTrainer, TrainerConfig, TrainingMetrics, TrainingOutcome};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Lifecycle of the served bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleState {
    /// No artifact on disk and nothing in memory
    Absent,
    /// Artifact on disk, not yet loaded
    Cold,
    Loaded,
}

/// Thread-safe owner of the current bundle
pub struct ModelService {
    data_path: PathBuf,
    store: ModelStore,
    trainer: ModelTrainer,
    bundle: RwLock<Option<Arc<TrainedBundle>>>,
    retrain_lock: Mutex<()>,
}

impl ModelService {
    pub fn new(data_path: impl Into<PathBuf>, store: ModelStore, trainer: ModelTrainer) -> Self {
        Self {
            data_path: data_path.into(),
            store,
            trainer,
            bundle: RwLock::new(None),
            retrain_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let trainer = ModelTrainer::new(
            TrainerConfig::default().with_seed(config.random_seed),
            DatasetProvider::new(config.sample_size, config.random_seed),
        );
        Self::new(&config.data_path, ModelStore::new(&config.model_path), trainer)
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn state(&self) -> BundleState {
        if self.bundle.read().is_some() {
            BundleState::Loaded
        } else if self.store.exists() {
            BundleState::Cold
        } else {
            BundleState::Absent
        }
    }

    /// The in-memory bundle, without touching disk
    pub fn current(&self) -> Option<Arc<TrainedBundle>> {
        self.bundle.read().clone()
    }

    /// Load the artifact into memory. Returns whether a bundle is now
    /// loaded; unreadable artifacts are logged and treated as absent.
    pub fn load(&self) -> bool {
        self.load_bundle().is_some()
    }

    fn load_bundle(&self) -> Option<Arc<TrainedBundle>> {
        if let Some(bundle) = self.current() {
            return Some(bundle);
        }
        match self.store.load() {
            Ok(Some(bundle)) => {
                let mut slot = self.bundle.write();
                // another thread may have loaded or retrained meanwhile
                if let Some(existing) = slot.as_ref() {
                    return Some(Arc::clone(existing));
                }
                info!(
                    path = %self.store.path().display(),
                    model = %bundle.metrics.model_name,
                    "Loaded model artifact"
                );
                let bundle = Arc::new(bundle);
                *slot = Some(Arc::clone(&bundle));
                Some(bundle)
            }
            Ok(None) => None,
            Err(e) => {
                error!(path = %self.store.path().display(), error = %e, "Failed to load model artifact");
                None
            }
        }
    }

    /// Predict one applicant, loading the artifact on first use
    pub fn predict(&self, record: &LoanRecord) -> PredictionOutcome {
        let Some(bundle) = self.load_bundle() else {
            warn!("Prediction requested but no model is available");
            return PredictionOutcome::Unavailable(Unavailable::NoModel);
        };
        let outcome = bundle.predict(record);
        if let PredictionOutcome::Unavailable(reason) = &outcome {
            warn!(reason = %reason, "Prediction unavailable");
        }
        outcome
    }

    /// Metrics of the current bundle, loading it if needed
    pub fn metrics(&self) -> Option<TrainingMetrics> {
        self.load_bundle().map(|b| b.metrics.clone())
    }

    /// Train on the configured data path, persist, and swap the new bundle in.
    /// On failure the previous bundle stays in place.
    pub fn retrain(&self) -> Result<TrainingMetrics> {
        let _guard = self.retrain_lock.lock();
        let TrainingOutcome { bundle, origin } = match self.trainer.train(&self.data_path, &self.store) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Retraining failed");
                return Err(e);
            }
        };
        let metrics = bundle.metrics.clone();
        *self.bundle.write() = Some(Arc::new(bundle));
        info!(
            model = %metrics.model_name,
            accuracy = metrics.accuracy,
            origin = ?origin,
            "Retrained model is now serving"
        );
        Ok(metrics)
    }

    /// Load the artifact, or train one when none exists
    pub fn ensure_ready(&self) -> Result<BundleState> {
        if self.load() {
            return Ok(BundleState::Loaded);
        }
        info!("No usable model artifact, training a new model");
        self.retrain()?;
        Ok(BundleState::Loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> ModelService {
        let trainer = ModelTrainer::new(
            TrainerConfig::default().with_n_estimators(5),
            DatasetProvider::new(150, 42),
        );
        ModelService::new(
            dir.path().join("loan_data.csv"),
            ModelStore::new(dir.path().join("loan_model.bin")),
            trainer,
        )
    }

    #[test]
    fn test_state_transitions() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        assert_eq!(svc.state(), BundleState::Absent);

        svc.retrain().unwrap();
        assert_eq!(svc.state(), BundleState::Loaded);

        let restarted = service(&dir);
        assert_eq!(restarted.state(), BundleState::Cold);
        assert!(restarted.load());
        assert_eq!(restarted.state(), BundleState::Loaded);
    }

    #[test]
    fn test_predict_without_model() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        let outcome = svc.predict(&LoanRecord::default());
        assert_eq!(outcome, PredictionOutcome::Unavailable(Unavailable::NoModel));
        assert_eq!(outcome.as_pair(), (None, 0.0));
        assert!(svc.metrics().is_none());
    }

    #[test]
    fn test_corrupt_artifact_is_absent() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("loan_model.bin"), b"garbage").unwrap();
        let svc = service(&dir);
        assert!(!svc.load());
        assert_eq!(svc.predict(&LoanRecord::default()).as_pair(), (None, 0.0));
    }

    #[test]
    fn test_ensure_ready_trains_once() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        assert_eq!(svc.ensure_ready().unwrap(), BundleState::Loaded);
        let first = svc.current().unwrap();

        assert_eq!(svc.ensure_ready().unwrap(), BundleState::Loaded);
        assert!(Arc::ptr_eq(&first, &svc.current().unwrap()));
    }
}
