use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use co2_insights::{
    analytics::{run_pipeline, Pipeline, RidgeRegression},
    config::{generate_sample_config, ConfigLoader},
    dataset::{Dataset, DatasetStore},
    logging::{init_logging, LogConfig},
    HttpJsonRpcServer, InsightsService,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Facility CO2 trend and anomaly insights
#[derive(Debug, Parser)]
#[command(name = "co2-insights", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the JSON-RPC server
    Serve {
        /// Configuration file (defaults to co2-insights.toml if present)
        #[arg(short, long, env = "CO2_CONFIG")]
        config: Option<PathBuf>,

        /// Bind address, overrides the configuration
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Analyse a CSV file for one facility and print the result as JSON
    Analyze {
        /// Path to the csv with emission data
        csv_file: PathBuf,

        /// Facility name
        #[arg(short, long)]
        facility: String,

        /// trend, efficiency or storage
        #[arg(short, long, default_value = "trend")]
        pipeline: Pipeline,

        /// Ridge regularization strength
        #[arg(long, default_value_t = RidgeRegression::DEFAULT_ALPHA)]
        alpha: f64,
    },

    /// Write a sample configuration file
    GenerateConfig {
        #[arg(short, long, default_value = "co2-insights.toml.example")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, bind } => serve(config, bind).await,
        Command::Analyze {
            csv_file,
            facility,
            pipeline,
            alpha,
        } => {
            init_logging(&LogConfig::default().with_console(false))?;
            analyze(&csv_file, &facility, pipeline, alpha)
        }
        Command::GenerateConfig { output } => {
            init_logging(&LogConfig::default())?;
            generate_sample_config(&output)?;
            Ok(())
        }
    }
}

async fn serve(config_path: Option<PathBuf>, bind: Option<String>) -> Result<()> {
    let config = ConfigLoader::new()
        .load_from_file(config_path)
        .load_from_env()
        .with_bind_addr(bind)
        .build()?;

    let _log_guard = init_logging(&LogConfig::from_server_config(&config.server))?;

    let store = Arc::new(match &config.dataset.path {
        Some(path) => DatasetStore::with_persist_path(path),
        None => DatasetStore::new(),
    });

    if config.dataset.load_on_startup {
        match store.load_persisted().await {
            Ok(Some(summary)) => info!("Active dataset restored ({} rows)", summary.rows),
            Ok(None) => info!("No dataset yet; waiting for upload_csv"),
            Err(e) => warn!("Persisted dataset could not be loaded: {}", e),
        }
    }

    let service = InsightsService::new(store, config.model);
    let server = HttpJsonRpcServer::new(service, config.server.max_upload_bytes);
    server.serve(&config.server.bind_addr).await
}

fn analyze(csv_file: &Path, facility: &str, pipeline: Pipeline, alpha: f64) -> Result<()> {
    let bytes = std::fs::read(csv_file)
        .with_context(|| format!("Failed to read {}", csv_file.display()))?;
    let dataset = Dataset::from_csv_bytes(&bytes)?;

    let result = run_pipeline(
        dataset.records(),
        facility,
        pipeline,
        &RidgeRegression::new(alpha),
    )?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
