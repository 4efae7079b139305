mod app;
mod cache;
mod config;
mod garmin;
mod llm;
mod prompt;
mod report;
mod retry;
mod stats;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::CacheStore;
use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "trainsight")]
#[command(about = "Garmin Connect training analysis with LLM-generated reports")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/trainsight/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Analysis window in days, counting back from today
  #[arg(short, long)]
  days: Option<i64>,

  /// Directory for generated reports
  #[arg(short, long)]
  output_dir: Option<PathBuf>,

  /// Training plan file included in the analysis prompt
  #[arg(long)]
  plan: Option<PathBuf>,

  /// Delete every cached entry before running
  #[arg(long)]
  clear_cache: bool,

  /// Skip the cache entirely for this run
  #[arg(long)]
  no_cache: bool,

  /// Override the cache TTL in hours
  #[arg(long)]
  cache_ttl_hours: Option<i64>,

  /// Print cache statistics as JSON and exit
  #[arg(long)]
  cache_stats: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = Config::load(args.config.as_deref())?;
  if let Some(days) = args.days {
    config.analysis_days = days;
  }
  if let Some(output_dir) = args.output_dir {
    config.output_dir = output_dir;
  }
  if let Some(plan) = args.plan {
    config.training_plan = Some(plan);
  }
  if let Some(ttl) = args.cache_ttl_hours {
    config.cache.ttl_hours = ttl;
  }
  if args.no_cache {
    config.cache.enabled = false;
  }

  let _guard = init_tracing(&config.output_dir)?;

  if args.cache_stats {
    let store = CacheStore::open(&config.cache.dir, config.cache.ttl_hours)?;
    let stats = store.stats()?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    return Ok(());
  }

  if args.clear_cache {
    let store = CacheStore::open(&config.cache.dir, config.cache.ttl_hours)?;
    store.clear_all()?;
  }

  let mut analyzer = app::TrainingAnalyzer::new(config)?;
  analyzer.run().await
}

/// Log to stdout and to a file in the output directory. The returned guard
/// must stay alive for the file writer to flush.
fn init_tracing(output_dir: &std::path::Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
  std::fs::create_dir_all(output_dir)
    .map_err(|e| eyre!("Failed to create output directory {}: {}", output_dir.display(), e))?;

  let (file_writer, guard) =
    tracing_appender::non_blocking(tracing_appender::rolling::never(output_dir, "trainsight.log"));

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with(fmt::layer())
    .with(fmt::layer().with_writer(file_writer).with_ansi(false))
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
