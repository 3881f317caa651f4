//! Loan Approval - Main Entry Point
//!
//! Serves the prediction web app by default; subcommands train, predict
//! and inspect the model from the shell.

use clap::Parser;
use loan_approval::cli::{cmd_metrics, cmd_predict, cmd_serve, cmd_train, Cli, Commands};
use loan_approval::data::LoanRecord;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loan_approval=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port, host }) => {
            cmd_serve(host, port).await?;
        }
        Some(Commands::Train { data, model }) => {
            tokio::task::spawn_blocking(move || cmd_train(data, model)).await??;
        }
        Some(Commands::Predict {
            model,
            gender,
            married,
            dependents,
            education,
            self_employed,
            applicant_income,
            coapplicant_income,
            loan_amount,
            loan_term,
            credit_history,
            property_area,
        }) => {
            let record = LoanRecord {
                gender: Some(gender),
                married: Some(married),
                dependents: Some(dependents),
                education: Some(education),
                self_employed: Some(self_employed),
                applicant_income: Some(applicant_income),
                coapplicant_income: Some(coapplicant_income),
                loan_amount: Some(loan_amount),
                loan_amount_term: Some(loan_term),
                credit_history: Some(credit_history),
                property_area: Some(property_area),
                loan_status: None,
            };
            tokio::task::spawn_blocking(move || cmd_predict(model, record)).await??;
        }
        Some(Commands::Metrics { model }) => {
            cmd_metrics(model)?;
        }
        None => {
            cmd_serve(None, None).await?;
        }
    }

    Ok(())
}
