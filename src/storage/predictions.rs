//! SQLite store of served predictions

use crate::data::LoanRecord;
use crate::error::Result;
use crate::inference::Prediction;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::debug;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS loan_prediction (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    applicant_income REAL NOT NULL,
    coapplicant_income REAL NOT NULL,
    loan_amount REAL NOT NULL,
    loan_amount_term INTEGER NOT NULL,
    credit_history INTEGER NOT NULL,
    gender TEXT NOT NULL,
    married TEXT NOT NULL,
    dependents TEXT NOT NULL,
    education TEXT NOT NULL,
    self_employed TEXT NOT NULL,
    property_area TEXT NOT NULL,
    prediction TEXT NOT NULL,
    confidence REAL NOT NULL,
    created_at TEXT NOT NULL
)";

/// One stored prediction
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PredictionRecord {
    pub id: i64,
    pub applicant_income: f64,
    pub coapplicant_income: f64,
    pub loan_amount: f64,
    pub loan_amount_term: i64,
    pub credit_history: i64,
    pub gender: String,
    pub married: String,
    pub dependents: String,
    pub education: String,
    pub self_employed: String,
    pub property_area: String,
    /// "Approved" or "Not Approved"
    pub prediction: String,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// Values of a prediction about to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrediction {
    pub applicant_income: f64,
    pub coapplicant_income: f64,
    pub loan_amount: f64,
    pub loan_amount_term: i64,
    pub credit_history: i64,
    pub gender: String,
    pub married: String,
    pub dependents: String,
    pub education: String,
    pub self_employed: String,
    pub property_area: String,
    pub prediction: String,
    pub confidence: f64,
}

impl NewPrediction {
    /// Capture the submitted values alongside the served prediction
    pub fn from_request(record: &LoanRecord, prediction: &Prediction) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            applicant_income: record.applicant_income.unwrap_or(0.0),
            coapplicant_income: record.coapplicant_income.unwrap_or(0.0),
            loan_amount: record.loan_amount.unwrap_or(0.0),
            loan_amount_term: record.loan_amount_term.map_or(0, i64::from),
            credit_history: record.credit_history.map_or(0, i64::from),
            gender: text(&record.gender),
            married: text(&record.married),
            dependents: text(&record.dependents),
            education: text(&record.education),
            self_employed: text(&record.self_employed),
            property_area: text(&record.property_area),
            prediction: prediction.status.label().to_string(),
            confidence: prediction.confidence,
        }
    }
}

/// Append-only prediction table
#[derive(Debug, Clone)]
pub struct PredictionStore {
    pool: SqlitePool,
}

impl PredictionStore {
    /// Open (creating if missing) the database and ensure the table exists
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // every in-memory connection is its own database
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        debug!(url, "Prediction store ready");
        Ok(Self { pool })
    }

    pub async fn insert(&self, record: &NewPrediction) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO loan_prediction (
                applicant_income, coapplicant_income, loan_amount, loan_amount_term,
                credit_history, gender, married, dependents, education, self_employed,
                property_area, prediction, confidence, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.applicant_income)
        .bind(record.coapplicant_income)
        .bind(record.loan_amount)
        .bind(record.loan_amount_term)
        .bind(record.credit_history)
        .bind(&record.gender)
        .bind(&record.married)
        .bind(&record.dependents)
        .bind(&record.education)
        .bind(&record.self_employed)
        .bind(&record.property_area)
        .bind(&record.prediction)
        .bind(record.confidence)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Most recent predictions first
    pub async fn recent(&self, limit: u32) -> Result<Vec<PredictionRecord>> {
        let rows = sqlx::query_as::<_, PredictionRecord>(
            "SELECT * FROM loan_prediction ORDER BY id DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM loan_prediction")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LoanStatus;

    fn sample(area: &str) -> NewPrediction {
        let record = LoanRecord {
            gender: Some("Male".to_string()),
            married: Some("Yes".to_string()),
            dependents: Some("0".to_string()),
            education: Some("Graduate".to_string()),
            self_employed: Some("No".to_string()),
            applicant_income: Some(5000.0),
            coapplicant_income: Some(0.0),
            loan_amount: Some(150.0),
            loan_amount_term: Some(360),
            credit_history: Some(1),
            property_area: Some(area.to_string()),
            loan_status: None,
        };
        let prediction = Prediction {
            status: LoanStatus::Approved,
            confidence: 0.87,
        };
        NewPrediction::from_request(&record, &prediction)
    }

    #[tokio::test]
    async fn test_insert_and_recent() {
        let store = PredictionStore::connect("sqlite::memory:").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        let first = store.insert(&sample("Urban")).await.unwrap();
        let second = store.insert(&sample("Rural")).await.unwrap();
        assert!(second > first);
        assert_eq!(store.count().await.unwrap(), 2);

        let recent = store.recent(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, second);
        assert_eq!(recent[0].property_area, "Rural");
        assert_eq!(recent[0].prediction, "Approved");
        assert_eq!(recent[0].loan_amount_term, 360);
        assert!((recent[0].confidence - 0.87).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("loans.db").display());
        let store = PredictionStore::connect(&url).await.unwrap();
        store.insert(&sample("Urban")).await.unwrap();
        drop(store);

        let reopened = PredictionStore::connect(&url).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
    }
}
