// This is the entry point of the race bib generator.
//
// **Architecture Overview:**
// - `core/` = Business logic (row mapping, bib generation, batch driving)
// - `infra/` = Implementations of core traits (Google APIs, report file)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Run one batch over the roster and report the outcome

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with a handful of mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;

use crate::core::bibs::{BibConfig, BibGenerator, BibService};
use crate::infra::google::{
    token_provider_from_env, GoogleDriveClient, GoogleSheetsClient, GoogleSlidesClient,
};
use crate::infra::report::JsonReportWriter;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file (if it exists).
    // Comes first so RUST_LOG from .env reaches the subscriber.
    dotenv::dotenv().ok();

    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = BibConfig::from_env().context("Invalid configuration")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // One HTTP client and one token provider shared by all Google clients.

    let auth = token_provider_from_env()
        .await
        .context("Could not set up Google credentials")?;
    let http = reqwest::Client::new();

    let roster = GoogleSheetsClient::new(http.clone(), Arc::clone(&auth), &config.spreadsheet_id)?;
    let slides = GoogleSlidesClient::new(http.clone(), Arc::clone(&auth));
    let drive = GoogleDriveClient::new(http, auth);

    let service = BibService::new(roster, BibGenerator::new(slides, drive));

    tracing::info!(
        sheet = %config.sheet_name,
        template = %config.template_id,
        folder = %config.output_folder_id,
        policy = ?config.export_policy,
        "Generating bibs"
    );

    let report = service.run_batch(&config).await?;

    tracing::info!(
        generated = report.generated_count(),
        skipped = report.skipped_count(),
        failed = report.failed_count(),
        "Batch finished"
    );

    if let Some(path) = &config.report_path {
        // Report problems never change the exit code.
        if let Err(e) = JsonReportWriter::new(path).write(&report).await {
            tracing::warn!("Failed to write run report: {}", e);
        }
    }

    Ok(())
}
