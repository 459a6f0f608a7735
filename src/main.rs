//! CLI entry point for harvesting a catalog listing page

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use catalog_harvester::{
    HarvestConfig, Harvester, OutputConfig, init_logging, write_outputs,
};

const DEFAULT_URL: &str = "https://www.gsshop.com/shop/wine/cate.gs?msectid=1548240";

#[derive(Debug, Parser)]
#[command(
    name = "catalog-harvester",
    version,
    about = "Harvest product records from a dynamically rendered catalog listing page"
)]
struct Cli {
    /// Target listing URL
    #[arg(long, default_value = DEFAULT_URL)]
    url: String,

    /// Minimum number of product cards to capture before exporting
    #[arg(long, default_value_t = 1000)]
    min_items: usize,

    /// Directory where output files are written
    #[arg(long, default_value = "data")]
    output_dir: PathBuf,

    /// File prefix for generated artifacts
    #[arg(long, default_value = "gsshop_whisky")]
    prefix: String,

    /// Disable JSON output (enabled by default)
    #[arg(long)]
    no_json: bool,

    /// Disable CSV output (enabled by default)
    #[arg(long)]
    no_csv: bool,

    /// Run the browser with a visible window for debugging
    #[arg(long)]
    no_headless: bool,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("harvest failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let output =
        OutputConfig::new(&cli.output_dir, &cli.prefix, !cli.no_csv, !cli.no_json)?;

    info!(url = %cli.url, min_items = cli.min_items, "starting harvest run");
    let harvester = Harvester::new(HarvestConfig {
        min_items: cli.min_items,
        headless: !cli.no_headless,
        ..HarvestConfig::default()
    });
    let products = harvester
        .collect(&cli.url)
        .await
        .context("harvest pipeline failed")?;
    info!(products = products.len(), "harvest complete");

    let written = write_outputs(&products, &output)?;
    for path in written {
        info!(path = %path.display(), "artifact written");
    }
    Ok(())
}
