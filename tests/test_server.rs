//! Integration test: Server routes

use axum::body::Body;
use axum::http::{Request, StatusCode};
use loan_approval::config::AppConfig;
use loan_approval::data::DatasetProvider;
use loan_approval::export::ModelStore;
use loan_approval::inference::ModelService;
use loan_approval::server::{create_router, AppState};
use loan_approval::storage::PredictionStore;
use loan_approval::training::{ModelTrainer, TrainerConfig};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const REFERENCE_JSON: &str = r#"{
    "Gender": "Male", "Married": "Yes", "Dependents": "0", "Education": "Graduate",
    "Self_Employed": "No", "ApplicantIncome": 5000, "CoapplicantIncome": 0,
    "LoanAmount": 150, "Loan_Amount_Term": 360, "Credit_History": 1,
    "Property_Area": "Urban"
}"#;

const REFERENCE_FORM: &str = "gender=Male&married=Yes&dependents=0&education=Graduate\
&self_employed=No&applicant_income=5000&coapplicant_income=0&loan_amount=150\
&loan_term=360&credit_history=1&property_area=Urban";

async fn test_state(dir: &TempDir) -> Arc<AppState> {
    let config = AppConfig::default()
        .with_data_path(dir.path().join("loan_data.csv"))
        .with_model_path(dir.path().join("loan_model.bin"))
        .with_database_url("sqlite::memory:");
    let trainer = ModelTrainer::new(
        TrainerConfig::default().with_n_estimators(10),
        DatasetProvider::new(200, 42),
    );
    let model = ModelService::new(&config.data_path, ModelStore::new(&config.model_path), trainer);
    let predictions = PredictionStore::connect(&config.database_url).await.unwrap();
    Arc::new(AppState::new(config, model, predictions))
}

async fn send(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = create_router(Arc::clone(state)).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    (status, bytes.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let (status, body) = send(&state, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "absent");
}

#[tokio::test]
async fn test_untrained_model_responses() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;

    let (status, body) = send(&state, get("/api/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], true);

    let (status, _) = send(&state, post_json("/api/predict", REFERENCE_JSON)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = send(&state, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("No model has been trained yet."));
}

#[tokio::test]
async fn test_retrain_then_predict() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;

    let (status, body) = send(&state, post_form("/retrain", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("Model retrained successfully."));
    assert!(dir.path().join("loan_model.bin").exists());

    let (status, body) = send(&state, get("/api/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    let metrics = json(&body);
    assert!(metrics["accuracy"].as_f64().unwrap() > 0.0);
    assert_eq!(metrics["training_samples"].as_u64().unwrap() + metrics["test_samples"].as_u64().unwrap(), 200);

    let (status, body) = send(&state, post_json("/api/predict", REFERENCE_JSON)).await;
    assert_eq!(status, StatusCode::OK);
    let prediction = json(&body);
    let label = prediction["label"].as_u64().unwrap();
    assert!(label <= 1);
    let expected = if label == 1 { "Approved" } else { "Not Approved" };
    assert_eq!(prediction["prediction"], expected);
    let confidence = prediction["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));

    let (status, body) = send(&state, post_form("/predict", REFERENCE_FORM)).await;
    assert_eq!(status, StatusCode::OK);
    let page = String::from_utf8(body).unwrap();
    assert!(page.contains(expected));
    assert!(page.contains("0.030"));

    let (status, body) = send(&state, get("/api/predictions?limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    let history = json(&body);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["property_area"], "Urban");
    assert_eq!(state.predictions.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_validation_errors() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;

    let (status, body) = send(
        &state,
        post_json("/api/predict", r#"{"Gender": "Male", "ApplicantIncome": 5000, "LoanAmount": 150}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["message"].as_str().unwrap().starts_with("Missing required fields"));

    let (status, body) = send(&state, post_form("/predict", "gender=Male&applicant_income=0")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("Missing required fields"));
    assert_eq!(state.predictions.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_fallbacks() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;

    let (status, body) = send(&state, get("/api/unknown")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], true);

    let (status, _) = send(&state, get("/predict")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
