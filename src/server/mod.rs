//! Loan Approval Server Module
//!
//! Web form, result page, retrain action and a small JSON API over the
//! shared model service and the prediction store.

mod api;
mod error;
mod form;
mod handlers;
mod pages;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use form::{prepare_application, LoanForm, DEFAULT_CREDIT_HISTORY, DEFAULT_LOAN_TERM};
pub use handlers::{PredictResponse, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};
pub use pages::Notice;
pub use state::AppState;

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;

/// Start the HTTP server. A model is loaded, or trained when no artifact
/// exists, before the listener opens.
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    info!(
        host = %config.host,
        port = config.port,
        data_path = %config.data_path.display(),
        model_path = %config.model_path.display(),
        database = %config.database_url,
        "Starting loan approval server"
    );

    let state = Arc::new(AppState::from_config(config).await?);

    let model = Arc::clone(&state.model);
    match tokio::task::spawn_blocking(move || model.ensure_ready()).await? {
        Ok(model_state) => info!(state = ?model_state, "Model ready"),
        Err(e) => warn!(error = %e, "No model available at startup; predictions are disabled until a retrain succeeds"),
    }

    let addr = state.config.bind_address();
    let app = create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
        let stop_time = chrono::Utc::now();
        let uptime = stop_time.signed_duration_since(start_time);
        info!(
            stopped_at = %stop_time.to_rfc3339(),
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
