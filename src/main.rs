use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use healing_pipeline::app::batch_use_case::{BatchSource, BatchUseCase};
use healing_pipeline::app::diagnose_use_case::diagnose_batch;
use healing_pipeline::config::PipelineConfig;
use healing_pipeline::constants::ENV_METRICS_ADDR;
use healing_pipeline::infra::http_client::HttpInferenceClient;
use healing_pipeline::infra::record_source::load_window;
use healing_pipeline::infra::report_output_adapter::FileReportOutput;
use healing_pipeline::pipeline::processing::diagnose::Diagnoser;
use healing_pipeline::types::Defect;
use healing_pipeline::{logging, observability};

#[derive(Parser)]
#[command(name = "healing-pipeline")]
#[command(about = "Self-healing sentiment classification for review batches")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct WindowArgs {
    /// JSON file containing an array of review records
    #[arg(long)]
    input: PathBuf,
    /// Index of the first record to process
    #[arg(long, default_value_t = 0)]
    offset: usize,
    /// Number of records to process (default: all remaining)
    #[arg(long)]
    batch_size: Option<usize>,
    /// TOML configuration file (default: pipeline.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Diagnose, heal and classify a batch, then write summary and health report
    Run {
        #[command(flatten)]
        window: WindowArgs,
        /// Directory for summary, results and health files
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },
    /// Only diagnose a batch and print the defect histogram
    Diagnose {
        #[command(flatten)]
        window: WindowArgs,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig> {
    PipelineConfig::load(path.map(|p| p.as_path())).map_err(|e| {
        error!("Configuration rejected: {}", e);
        anyhow::Error::new(e)
    })
}

async fn run(window: WindowArgs, output_dir: PathBuf) -> Result<()> {
    let config = load_config(window.config.as_ref())?;
    let records = load_window(&window.input, window.offset, window.batch_size)
        .with_context(|| format!("loading records from {}", window.input.display()))?;

    let inference = HttpInferenceClient::new(&config.inference())
        .map_err(|e| anyhow::anyhow!("building inference client: {}", e))?;
    let use_case = BatchUseCase::with_inference(
        &config,
        Arc::new(inference),
        Box::new(FileReportOutput::new(output_dir)),
    );

    let source = BatchSource {
        input_file: window.input.display().to_string(),
        offset: window.offset,
        batch_size: window.batch_size,
    };
    let report = use_case.run(records, source).await?;

    let totals = report.summary.totals;
    println!("\n📊 Batch results for {}:", report.health.pipeline);
    println!("   Processed: {}", totals.processed);
    println!("   Success:   {}", totals.success);
    println!("   Healed:    {}", totals.healed);
    println!("   Degraded:  {}", totals.degraded);
    println!("   Health:    {}", report.health.health_status);
    Ok(())
}

fn diagnose(window: WindowArgs) -> Result<()> {
    let config = load_config(window.config.as_ref())?;
    let records = load_window(&window.input, window.offset, window.batch_size)
        .with_context(|| format!("loading records from {}", window.input.display()))?;

    let histogram = diagnose_batch(&Diagnoser::new(config.max_text_length), &records);
    info!(
        total = histogram.total,
        defect_rate = histogram.defect_rate(),
        "Diagnosis finished"
    );
    println!("\n🔎 Defects in {} records:", histogram.total);
    for defect in Defect::ALL {
        println!("   {:<16} {}", defect.as_str(), histogram.count(defect));
    }
    println!("   Defect rate: {:.1}%", histogram.defect_rate() * 100.0);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    if let Ok(addr) = std::env::var(ENV_METRICS_ADDR) {
        observability::init_metrics(&addr);
    }

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { window, output_dir } => run(window, output_dir).await,
        Commands::Diagnose { window } => diagnose(window),
    }
}
