//! Application state management

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::inference::ModelService;
use crate::storage::PredictionStore;

/// Application state shared across handlers
pub struct AppState {
    pub config: AppConfig,
    pub model: Arc<ModelService>,
    pub predictions: PredictionStore,
}

impl AppState {
    pub fn new(config: AppConfig, model: ModelService, predictions: PredictionStore) -> Self {
        Self {
            config,
            model: Arc::new(model),
            predictions,
        }
    }

    /// Build the model service and open the prediction store from `config`
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let predictions = PredictionStore::connect(&config.database_url).await?;
        let model = ModelService::from_config(&config);
        Ok(Self::new(config, model, predictions))
    }
}
