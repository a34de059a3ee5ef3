// ABOUTME: Entry point for the cricheck CLI application.
// ABOUTME: Parses arguments and dispatches to the suite runner.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use cricheck::config::{self, Config, DEFAULT_SOCKET};
use cricheck::error::{Error, Result};
use cricheck::fixtures;
use cricheck::output::{Output, OutputMode};
use cricheck::runtime::{BollardBackend, FakeBackend};
use cricheck::suite::{self, RunReport, SuiteSettings};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(mode);

    if let Err(e) = run(cli, &output).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    match cli.command {
        Commands::Init { force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, force)
        }
        Commands::Run { socket, config } => {
            let cwd = env::current_dir()?;
            let config = match config {
                Some(path) => Config::load(&path)?,
                None => Config::discover_or_default(&cwd)?,
            };

            let socket = socket
                .or_else(|| config.socket.clone())
                .unwrap_or_else(|| DEFAULT_SOCKET.to_string());
            let settings = config.suite_settings()?;

            let mut backend = BollardBackend::connect(&socket).await?;
            if let Some(sandbox_image) = &config.sandbox_image {
                backend = backend.with_sandbox_image(sandbox_image.clone());
            }

            let report = suite::run_suite(Arc::new(backend), &settings, output).await;
            finish(report, output)
        }
        Commands::Selfcheck => {
            let backend = FakeBackend::with_catalog(fixtures::fake_catalog());
            let settings = SuiteSettings {
                poll_interval: Duration::from_millis(10),
                poll_deadline: Duration::from_secs(5),
                stress_images: fixtures::selfcheck_stress_list(),
            };

            let report = suite::run_suite(Arc::new(backend), &settings, output).await;
            finish(report, output)
        }
    }
}

fn finish(report: RunReport, output: &Output) -> Result<()> {
    output.summary(&report);
    if report.all_passed() {
        Ok(())
    } else {
        Err(Error::ScenariosFailed {
            failed: report.failed_count(),
            total: report.scenarios.len(),
        })
    }
}
