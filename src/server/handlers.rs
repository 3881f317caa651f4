//! Request handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Html,
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::error::{Result, ServerError};
use super::form::{prepare_application, LoanForm};
use super::pages::{self, Notice};
use super::state::AppState;
use crate::data::LoanRecord;
use crate::inference::{Prediction, PredictionOutcome};
use crate::storage::{NewPrediction, PredictionRecord};
use crate::training::TrainingMetrics;

pub const DEFAULT_HISTORY_LIMIT: u32 = 20;
pub const MAX_HISTORY_LIMIT: u32 = 100;

async fn current_metrics(state: &AppState) -> Result<Option<TrainingMetrics>> {
    let model = Arc::clone(&state.model);
    Ok(tokio::task::spawn_blocking(move || model.metrics()).await?)
}

async fn run_prediction(state: &AppState, record: LoanRecord) -> Result<(LoanRecord, PredictionOutcome)> {
    let model = Arc::clone(&state.model);
    let result = tokio::task::spawn_blocking(move || {
        let outcome = model.predict(&record);
        (record, outcome)
    })
    .await?;
    Ok(result)
}

/// Store a served prediction. Failures are logged; the caller still gets
/// its prediction.
async fn record_prediction(state: &AppState, record: &LoanRecord, prediction: &Prediction) {
    match state
        .predictions
        .insert(&NewPrediction::from_request(record, prediction))
        .await
    {
        Ok(id) => info!(id, prediction = %prediction.status.label(), "Stored prediction"),
        Err(e) => error!(error = %e, "Failed to store prediction"),
    }
}

async fn render_index(state: &AppState, notice: Option<Notice>) -> Result<Html<String>> {
    let metrics = current_metrics(state).await?;
    Ok(Html(pages::index_page(metrics.as_ref(), notice.as_ref())))
}

// ============================================================================
// Web UI
// ============================================================================

pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>> {
    render_index(&state, None).await
}

pub async fn predict_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoanForm>,
) -> Result<Html<String>> {
    let record = match form.into_record() {
        Ok(record) => record,
        Err(message) => {
            info!(reason = %message, "Rejected loan application");
            return render_index(&state, Some(Notice::Error(message))).await;
        }
    };

    let (record, outcome) = run_prediction(&state, record).await?;
    let Some(prediction) = outcome.prediction().copied() else {
        return render_index(
            &state,
            Some(Notice::Error("Prediction failed. Please check input values.".to_string())),
        )
        .await;
    };

    record_prediction(&state, &record, &prediction).await;
    let ratio = record.income_ratio().unwrap_or(0.0);
    Ok(Html(pages::result_page(&record, &prediction, ratio)))
}

pub async fn retrain_form(State(state): State<Arc<AppState>>) -> Result<Html<String>> {
    let model = Arc::clone(&state.model);
    let result = tokio::task::spawn_blocking(move || model.retrain()).await?;
    let notice = match result {
        Ok(metrics) => {
            info!(model = %metrics.model_name, accuracy = metrics.accuracy, "Retrain requested from web UI");
            Notice::Success("Model retrained successfully.".to_string())
        }
        Err(_) => Notice::Error("Failed to retrain model.".to_string()),
    };
    render_index(&state, Some(notice)).await
}

// ============================================================================
// JSON API
// ============================================================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.model.state(),
    }))
}

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Result<Json<TrainingMetrics>> {
    current_metrics(&state)
        .await?
        .map(Json)
        .ok_or_else(|| ServerError::NotFound("No model has been trained yet".to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    /// 1 approved, 0 not approved
    pub label: u8,
    pub prediction: String,
    pub confidence: f64,
}

pub async fn predict_api(
    State(state): State<Arc<AppState>>,
    Json(record): Json<LoanRecord>,
) -> Result<Json<PredictResponse>> {
    let record = prepare_application(record).map_err(ServerError::BadRequest)?;
    let (record, outcome) = run_prediction(&state, record).await?;
    let prediction = match outcome {
        PredictionOutcome::Ready(p) => p,
        PredictionOutcome::Unavailable(reason) => {
            return Err(ServerError::Unavailable(reason.to_string()));
        }
    };

    record_prediction(&state, &record, &prediction).await;
    Ok(Json(PredictResponse {
        label: prediction.label(),
        prediction: prediction.status.label().to_string(),
        confidence: prediction.confidence,
    }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

pub async fn recent_predictions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<PredictionRecord>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    Ok(Json(state.predictions.recent(limit).await?))
}
