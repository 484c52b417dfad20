//! Command-line interface for search-loadtest
//!
//! # Usage Examples
//!
//! ```bash
//! # One minute at the defaults (10 bulk req/s, 5 QPS per backend)
//! search-loadtest
//!
//! # Heavier write load against remote backends, five minutes
//! search-loadtest \
//!   --index-rate 50 --query-rate 20 --bulk-size 100 --duration 5m \
//!   --es-endpoint http://es:9200 --solr-endpoint http://solr:8983
//!
//! # Settings from a file, report as JSON
//! search-loadtest --config loadtest.toml --output-format json
//! ```

use anyhow::Context;
use clap::Parser;
use search_loadtest::cli::{OutputFormat, RunArgs};
use search_loadtest::config::RunConfig;
use search_loadtest::coordinator::RunCoordinator;
use search_loadtest::report;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "search-loadtest")]
#[command(about = "Concurrent read/write load tester for Elasticsearch and Solr")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    run: RunArgs,

    /// Format of the final report
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, env = "LOADTEST_OUTPUT_FORMAT")]
    output_format: OutputFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = RunConfig::resolve(&cli.run).context("Invalid configuration")?;

    if cli.output_format == OutputFormat::Text {
        println!("🚀 Concurrent Read/Write Performance Testing");
        println!(
            "📊 Configuration: {} bulk req/sec indexing ({} docs each), {} QPS querying, {:?} test",
            config.index_rate, config.bulk_size, config.query_rate, config.duration
        );
        println!(
            "   Elasticsearch: {}/{}  Solr: {}/solr/{}",
            config.es_endpoint, config.es_index, config.solr_endpoint, config.solr_core
        );
    }

    // Ctrl-C ends the run early; the report still covers what was done
    let shutdown = CancellationToken::new();
    let interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping workers");
            interrupt.cancel();
        }
    });

    let mut coordinator = RunCoordinator::new(config.clone())?;
    let outcome = coordinator.run_until(shutdown).await?;

    let report = report::analyze(&outcome.metrics, &config).with_workers(outcome.workers);
    println!("{}", report::render(&report, cli.output_format)?);

    if cli.output_format == OutputFormat::Text {
        println!("✅ Concurrent Read/Write Performance Test Complete!");
    }

    Ok(())
}
