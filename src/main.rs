//! flexion CLI - train, upload and classify flex sensor readings.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flexion::client::upload_file;
use flexion::{Config, EndpointClient, InferenceHandler, Invoker, StorageClient, TrainingPipeline};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "flexion")]
#[command(version)]
#[command(about = "Flex sensor classification: training pipeline and serving tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "flexion.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a classifier from a CSV of flex readings
    Train {
        /// Path to the training data CSV (flex_value,label)
        data: PathBuf,
    },

    /// Upload raw training data to object storage
    Upload {
        /// Local file to upload
        file: PathBuf,

        /// Destination object key (defaults to data/<file name>)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Classify a single flex reading via the deployed endpoint
    Classify {
        /// Raw flex sensor value
        value: f64,
    },

    /// Validate configuration file
    Validate,

    /// Show example configuration
    Example,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

/// Load config from `path`, falling back to built-in defaults when the file
/// does not exist. The `validate` command bypasses this and always reads.
fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        info!(path = %path.display(), "No config file found, using defaults");
        return Ok(Config::default());
    }
    let config = Config::from_file(path)
        .with_context(|| format!("Failed to load config from {path:?}"))?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn default_object_key(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    format!("data/{name}")
}

fn format_scores(scores: &[f64]) -> String {
    scores
        .iter()
        .map(|s| format!("{s:.3}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_example_config() {
    let example = r#"# flexion configuration file

[endpoint]
base_url = "http://127.0.0.1:8080"
name = "flex-classifier"
timeout_secs = 30
max_retries = 3
backoff_base_secs = 1
# Bearer token, either inline or via env var
# api_key = "..."
# api_key_env = "FLEXION_ENDPOINT_TOKEN"

[storage]
base_url = "http://127.0.0.1:9000"
bucket = "flex-sensor-data"
timeout_secs = 30
max_retries = 3
backoff_base_secs = 1
# api_key_env = "FLEXION_STORAGE_TOKEN"

[training]
test_ratio = 0.2
cv_folds = 5
trees = 100
max_depth = 10
min_samples_split = 5
seed = 42

[output]
model_dir = "model"
"#;
    println!("{example}");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Example => {
            print_example_config();
            return Ok(());
        }

        Commands::Validate => {
            let config = Config::from_file(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
            config.validate().context("Invalid configuration")?;

            info!("Configuration is valid");
            info!(
                "  Endpoint: {} at {}",
                config.endpoint.name, config.endpoint.base_url
            );
            info!(
                "  Storage:  {}/{}",
                config.storage.base_url, config.storage.bucket
            );
            info!(
                "  Training: {} trees, depth {}, {}-fold CV, seed {}",
                config.training.trees,
                config.training.max_depth,
                config.training.cv_folds,
                config.training.seed
            );
            info!("  Model dir: {}", config.output.model_dir.display());
            return Ok(());
        }

        Commands::Train { data } => {
            let config = load_config(&cli.config)?;
            let pipeline = TrainingPipeline::new(&config);
            let summary = pipeline.run(&data)?;

            println!("\n=== Training Complete ===");
            println!("Rows:        {}", summary.rows);
            println!("Classes:     {}", summary.classes.join(", "));
            println!("Train/Test:  {}/{}", summary.train_size, summary.test_size);
            println!("CV scores:   {}", format_scores(&summary.cv_scores));
            println!("CV mean:     {:.3}", summary.cv_mean);
            println!("Accuracy:    {:.3}", summary.test_accuracy);
            println!("Runtime:     {:.1}s", summary.runtime_secs);
            println!("Artifact:    {}", summary.artifact_path.display());
            println!("\n{}", summary.report);
        }

        Commands::Upload { file, key } => {
            let config = load_config(&cli.config)?;
            let store = StorageClient::new(&config.storage)?;
            let invoker = Invoker::new(
                config.storage.max_retries,
                Duration::from_secs(config.storage.backoff_base_secs),
            );

            let key = key.unwrap_or_else(|| default_object_key(&file));
            let location =
                upload_file(&store, &invoker, &config.storage.bucket, &file, &key).await?;
            println!("Uploaded {} to {location}", file.display());
        }

        Commands::Classify { value } => {
            let config = load_config(&cli.config)?;
            let endpoint = Arc::new(EndpointClient::new(&config.endpoint)?);
            let invoker = Invoker::new(
                config.endpoint.max_retries,
                Duration::from_secs(config.endpoint.backoff_base_secs),
            );
            let handler = InferenceHandler::new(endpoint, invoker);

            let request = serde_json::json!({ "flex_value": value });
            let response = handler.handle(&request).await;
            println!("{}", serde_json::to_string_pretty(&response.body)?);

            if response.status_code != 200 {
                anyhow::bail!("Classification failed with status {}", response.status_code);
            }
        }
    }

    Ok(())
}
