mod bootstrap;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use metrics_core::settings::Settings;
use metrics_data::report::summary_lines;
use metrics_runtime::credentials::resolve_credentials;
use metrics_runtime::pipeline::{self, OutputPaths, Stage};
use metrics_runtime::sheets::{SheetsClient, SheetsConfig};
use metrics_runtime::source::DumpSource;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let settings = Settings::load();

    if let Err(e) = bootstrap::setup_logging(&settings.log_level) {
        eprintln!("Failed to initialise logging: {:#}", e);
    }

    tracing::info!("sheet-metrics v{} starting", env!("CARGO_PKG_VERSION"));

    match run(&settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("run aborted: {:#}", e);
            println!("❌ Run failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: &Settings) -> Result<()> {
    settings.validate()?;

    let print_stage = |stage: &Stage| println!("{}", stage);

    let summary = match &settings.from_dump {
        Some(dump) => {
            tracing::info!("Re-aggregating {} offline", dump.display());
            let outputs = OutputPaths {
                raw_dump: None,
                summary: settings.summary_output.clone(),
            };
            pipeline::run(&DumpSource::new(dump), &outputs, print_stage).await?
        }
        None => {
            let credentials = resolve_credentials(&settings.key_file)
                .context("could not resolve service account credentials")?;
            println!("🔑 Using credentials from {}", credentials.source);

            let client = SheetsClient::new(credentials, sheets_config(settings))?;
            pipeline::run(&client, &output_paths(settings), print_stage)
                .await
                .context("fetching and aggregating sheet data")?
        }
    };

    for line in summary_lines(&summary) {
        println!("   {}", line);
    }

    Ok(())
}

fn sheets_config(settings: &Settings) -> SheetsConfig {
    SheetsConfig {
        spreadsheet_id: settings.spreadsheet_id.clone(),
        sheet_name: settings.sheet_name.clone(),
        api_base: settings.sheets_api_base.clone(),
        timeout: Duration::from_secs(settings.timeout_secs),
    }
}

fn output_paths(settings: &Settings) -> OutputPaths {
    OutputPaths {
        raw_dump: Some(settings.data_output.clone()),
        summary: settings.summary_output.clone(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
