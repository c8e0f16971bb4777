use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{debug, error, info};

mod cli;
mod client;
mod config;
mod interactive;
mod models;
mod nodes;
mod normalize;
mod output;
mod render;
mod utils;

use crate::cli::{Cli, Command};
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::models::CheckType;
use crate::nodes::NodeTable;
use crate::normalize::{normalize, NormalizedResults};
use crate::output::OutputFormat;
use crate::render::Renderer;

#[tokio::main]
async fn main() -> Result<()> {
    utils::setup_console();

    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_ansi(true)
        .init();

    let config = ClientConfig::load().context("Failed to load client configuration")?;
    let table = NodeTable::builtin();
    debug!(
        "Catalog loaded: {} vantage points across {} regions",
        table.len(),
        table.continents().len()
    );
    let client = ApiClient::new(config).context("Failed to build API client")?;

    let run = async {
        match cli.command {
            Some(command) => run_command(&client, &table, command).await,
            None => interactive::run(&client, &table).await,
        }
    };

    tokio::select! {
        result = run => result,
        _ = signal::ctrl_c() => {
            info!("Operation cancelled by user");
            Ok(())
        }
    }
}

async fn run_command(client: &ApiClient, table: &NodeTable, command: Command) -> Result<()> {
    let (check, target, out) = command.into_check();
    let results = check_from_everywhere(client, table, check, &target).await?;

    info!(
        "{}/{} vantage points succeeded",
        results.values().filter(|r| r.success()).count(),
        results.len()
    );
    Renderer::stdout().print(check, &results);

    if let Some(path) = &out.output {
        save_results(&results, path, out.format);
    }
    Ok(())
}

/// One full check: submit, wait for the fleet to report, normalize.
pub(crate) async fn check_from_everywhere(
    client: &ApiClient,
    table: &NodeTable,
    check: CheckType,
    target: &str,
) -> Result<NormalizedResults> {
    info!("Submitting {} check for {}", check, target);
    let handle = client.submit(check, target, &table.all_ids()).await?;

    info!("Waiting for vantage points to report...");
    let raw = client.wait_for_results(&handle).await?;

    Ok(normalize(check, &raw, table))
}

/// Persistence failures are reported, not fatal; the results are already on
/// screen.
fn save_results(results: &NormalizedResults, path: &std::path::Path, format: OutputFormat) {
    match output::save(results, path, format) {
        Ok(()) => info!("Results saved to {}", path.display()),
        Err(e) => error!("Failed to save results: {e:#}"),
    }
}
