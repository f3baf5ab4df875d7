//! CLI entry point for the subway delay report.
//!
//! Provides subcommands for producing the full set of report tables, writing
//! the cleaned record set, and listing the datasets published by the
//! open-data catalog.

mod infra;
mod services;

use crate::infra::opendata::client::OpenDataClient;
use crate::services::catalog_api::{CatalogApi, latest_csv};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use subway_delay_report::analyzers::aggregate::DEFAULT_TOP_N;
use subway_delay_report::analyzers::analyzer::{ReportOptions, analyze};
use subway_delay_report::{
    cleaner::clean,
    fetch::load_source,
    output::{print_json, print_pretty, write_cleaned, write_report_tables},
    parser::parse_delays,
    record::DelayRecord,
};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_BASE_URL: &str = "https://ckan0.cf.opendata.inter.prod-toronto.ca";
const DEFAULT_PACKAGE: &str = "ttc-subway-delay-data";

#[derive(Parser)]
#[command(name = "subway_delay_report")]
#[command(about = "Clean and summarise subway delay data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct CatalogArgs {
    /// Catalog package holding the delay dataset
    #[arg(long, env = "DELAY_DATA_PACKAGE", default_value = DEFAULT_PACKAGE)]
    package: String,

    /// Base URL of the CKAN open-data portal
    #[arg(long, env = "OPEN_DATA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute every report table and write them as CSV and JSON
    Report {
        /// Path to file or URL to fetch; defaults to the newest CSV in the catalog
        #[arg(value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// Directory to write the tables into
        #[arg(short, long, default_value = "outputs")]
        output_dir: PathBuf,

        /// Number of groups kept by the station and delay-code rankings
        #[arg(long, default_value_t = DEFAULT_TOP_N, value_parser = parse_top_n)]
        top_n: usize,

        /// Also log the whole report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        #[command(flatten)]
        catalog: CatalogArgs,
    },
    /// Write the cleaned and recoded record set as CSV
    Clean {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// CSV file to write
        #[arg(short, long, default_value = "outputs/cleaned_delays.csv")]
        output: PathBuf,
    },
    /// List the resources published under the delay dataset package
    ListResources {
        #[command(flatten)]
        catalog: CatalogArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/subway_delay_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("subway_delay_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            source,
            output_dir,
            top_n,
            json,
            catalog,
        } => {
            let source = match source {
                Some(source) => source,
                None => resolve_latest(&catalog).await?,
            };

            let records = load_records(&source).await?;
            let report = analyze(&records, &ReportOptions { top_n }).with_source(&source);

            print_pretty(&report);
            if json {
                print_json(&report)?;
            }

            write_report_tables(&output_dir, &report)?;
        }
        Commands::Clean { source, output } => {
            let records = load_records(&source).await?;
            write_cleaned(&output, &records)?;
        }
        Commands::ListResources { catalog } => {
            let client = OpenDataClient::new(&catalog.base_url)?;
            let resources = client.list_resources(&catalog.package).await?;

            info!(total = resources.len(), package = %catalog.package, "Resource list fetched");

            for resource in &resources {
                info!(
                    resource_id = %resource.id,
                    name = %resource.name,
                    format = resource.format.as_deref().unwrap_or("unknown"),
                    last_modified = resource.last_modified.as_deref().unwrap_or("-"),
                    has_url = resource.url.is_some(),
                    "Resource"
                );
            }

            let csv_count = resources.iter().filter(|r| r.is_csv()).count();
            info!(
                total = resources.len(),
                csv = csv_count,
                "Resource list summary"
            );
        }
    }

    Ok(())
}

/// Parses `--top-n`, which must keep at least one group.
fn parse_top_n(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Reads, parses and cleans the delay dataset at `source`.
#[tracing::instrument(skip_all, fields(source = %source))]
async fn load_records(source: &str) -> Result<Vec<DelayRecord>> {
    let bytes = load_source(source).await?;
    let table = parse_delays(&bytes)?;
    info!(
        rows = table.len(),
        columns = table.headers.len(),
        "Raw delay table loaded"
    );

    Ok(clean(&table)?)
}

/// Finds the download URL of the newest CSV published in the catalog package.
#[tracing::instrument(skip_all, fields(package = %catalog.package))]
async fn resolve_latest(catalog: &CatalogArgs) -> Result<String> {
    let client = OpenDataClient::new(&catalog.base_url)?;
    let resources = client.list_resources(&catalog.package).await?;

    let resource = latest_csv(&resources).ok_or_else(|| {
        anyhow::anyhow!("Package '{}' has no CSV resource", catalog.package)
    })?;
    let url = resource
        .url
        .clone()
        .ok_or_else(|| anyhow::anyhow!("Resource '{}' has no URL", resource.id))?;

    info!(
        resource_id = %resource.id,
        name = %resource.name,
        url = %url,
        "Using newest CSV resource"
    );
    Ok(url)
}
