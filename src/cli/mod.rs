//! Loan Approval CLI Module
//!
//! Command-line interface for serving, training, one-off predictions and
//! inspecting the stored model.

use clap::{Parser, Subcommand};
use colored::*;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::AppConfig;
use crate::data::LoanRecord;
use crate::export::ModelStore;
use crate::inference::{ModelService, PredictionOutcome};
use crate::server::{prepare_application, DEFAULT_CREDIT_HISTORY, DEFAULT_LOAN_TERM};
use crate::training::TrainingMetrics;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str, visible_len: usize) {
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
    let _ = std::io::stdout().flush();
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn row(key: &str, val: &str) {
    println!("  {:<20} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "loan-approval")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Loan approval prediction service")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    Serve {
        /// Server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Server host
        #[arg(long)]
        host: Option<String>,
    },

    /// Train a model and persist it
    Train {
        /// Training table (CSV); synthesized when missing
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Output model artifact
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Predict a single application with the stored model
    Predict {
        /// Model artifact
        #[arg(short, long)]
        model: Option<PathBuf>,

        #[arg(long)]
        gender: String,

        #[arg(long)]
        married: String,

        #[arg(long)]
        dependents: String,

        #[arg(long)]
        education: String,

        #[arg(long)]
        self_employed: String,

        #[arg(long)]
        applicant_income: f64,

        #[arg(long, default_value = "0")]
        coapplicant_income: f64,

        /// Loan amount in thousands
        #[arg(long)]
        loan_amount: f64,

        /// Term in months
        #[arg(long, default_value_t = DEFAULT_LOAN_TERM)]
        loan_term: u32,

        #[arg(long, default_value_t = DEFAULT_CREDIT_HISTORY)]
        credit_history: u8,

        #[arg(long)]
        property_area: String,
    },

    /// Show metrics of the stored model
    Metrics {
        /// Model artifact
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
}

/// Configuration from the environment with CLI overrides applied
fn config_with(data: Option<PathBuf>, model: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::default();
    if let Some(data) = data {
        config = config.with_data_path(data);
    }
    if let Some(model) = model {
        config = config.with_model_path(model);
    }
    config.validate()?;
    Ok(config)
}

fn print_metrics(metrics: &TrainingMetrics) {
    row("Model", &metrics.model_name);
    row("Accuracy", &format!("{:.4}", metrics.accuracy));
    row("Training rows", &metrics.training_samples.to_string());
    row("Test rows", &metrics.test_samples.to_string());
    row("Trained at", &metrics.trained_at.to_rfc3339());
    for candidate in &metrics.candidates {
        row(
            &format!("  {}", candidate.model_name),
            &format!("{:.4}", candidate.accuracy),
        );
    }
    println!();
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(data: Option<PathBuf>, model: Option<PathBuf>) -> anyhow::Result<()> {
    let config = config_with(data, model)?;
    section("Train");

    step_run(&format!("Training on {}", config.data_path.display()));
    let start = Instant::now();
    let service = ModelService::from_config(&config);
    let metrics = service.retrain()?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    print_metrics(&metrics);
    row("Saved to", &config.model_path.display().to_string());
    println!();
    Ok(())
}

pub fn cmd_predict(model: Option<PathBuf>, record: LoanRecord) -> anyhow::Result<()> {
    let config = config_with(None, model)?;
    section("Predict");

    let record = prepare_application(record).map_err(anyhow::Error::msg)?;
    let service = ModelService::from_config(&config);
    match service.predict(&record) {
        PredictionOutcome::Ready(prediction) => {
            let label = prediction.status.label();
            let label = if prediction.label() == 1 { label.green().bold() } else { label.red().bold() };
            println!("  {:<20} {}", muted("Decision"), label);
            row("Confidence", &format!("{:.1}%", prediction.confidence * 100.0));
            if let Some(ratio) = record.income_ratio() {
                row("Loan to income", &format!("{ratio:.3}"));
            }
            println!();
            Ok(())
        }
        PredictionOutcome::Unavailable(reason) => {
            println!("  {}", format!("No prediction: {reason}").yellow());
            println!();
            anyhow::bail!("prediction unavailable: {reason}")
        }
    }
}

pub fn cmd_metrics(model: Option<PathBuf>) -> anyhow::Result<()> {
    let config = config_with(None, model)?;
    section("Metrics");

    match ModelStore::new(&config.model_path).load()? {
        Some(bundle) => print_metrics(&bundle.metrics),
        None => {
            println!(
                "  {}",
                format!("No trained model at {}", config.model_path.display()).yellow()
            );
            println!();
        }
    }
    Ok(())
}

pub async fn cmd_serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = AppConfig::default();
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }

    let version = format!("v{}", env!("CARGO_PKG_VERSION"));
    let web = format!("http://{}", config.bind_address());
    let health = format!("{web}/api/health");

    println!();
    line_box_top();
    line_box(&format!("{} {}", "Loan Approval".white().bold(), dim(&version)), 14 + version.len());
    line_box_sep();
    line_box(&format!("{} {}", muted("Web UI "), web.white()), 8 + web.len());
    line_box(&format!("{} {}", muted("Health "), health.white()), 8 + health.len());
    line_box(&format!("{}", dim("ctrl+c to stop")), 14);
    line_box_bottom();
    println!();

    crate::server::run_server(config).await
}
