use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use optnet::metrics::load_batch;
use optnet::prelude::*;

use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "optnet")]
#[command(version)]
#[command(about = "Flag hosts that need optimization with an untrained placeholder network", long_about = None)]
struct Cli {
  /// CPU usage of the host
  #[arg(long, allow_hyphen_values = true, requires_all = ["memory", "connections"])]
  cpu: Option<f64>,

  /// Memory usage of the host
  #[arg(long, allow_hyphen_values = true)]
  memory: Option<f64>,

  /// Number of active connections
  #[arg(long, allow_hyphen_values = true)]
  connections: Option<f64>,

  /// JSON file holding an array of metrics objects
  #[arg(long, conflicts_with = "cpu")]
  batch: Option<PathBuf>,

  /// Directory searched for optnet.toml
  #[arg(long, env = "OPTNET_CONFIG_DIR", default_value = ".")]
  config: PathBuf,

  /// Seed the weights so repeated runs agree
  #[arg(long)]
  seed: Option<u64>,

  /// Decision threshold in [0, 1]
  #[arg(long)]
  threshold: Option<f64>,

  /// Print JSON instead of text
  #[arg(long)]
  json: bool
}

fn main() -> Result<()> {
  init_logging();
  let cli = Cli::parse();

  run(&cli, &mut io::stdout().lock())
}

fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
  let mut config = AnalyzerConfig::load_from(&cli.config)
    .with_context(|| format!("loading config from {}", cli.config.display()))?;
  if let Some(seed) = cli.seed {
    config.seed = Some(seed);
  }
  if let Some(threshold) = cli.threshold {
    config.threshold = threshold;
  }
  let analyzer = Analyzer::new(&config)?;

  let batch = match (&cli.batch, cli.cpu, cli.memory, cli.connections) {
    (Some(path), ..) => load_batch(path)
      .with_context(|| format!("loading batch from {}", path.display()))?,
    (None, Some(cpu), Some(memory), Some(connections)) => vec![Metrics::new(cpu, memory, connections)],
    _ => bail!("pass either --cpu/--memory/--connections or --batch <file>")
  };

  let analyses = analyzer.analyze_batch(&batch)?;

  if cli.json {
    writeln!(out, "{}", serde_json::to_string_pretty(&analyses)?)?;
  } else {
    for (metrics, analysis) in batch.iter().zip(&analyses) {
      writeln!(
        out,
        "cpu={} memory={} connections={} probability={:.4} optimize={}",
        metrics.cpu_usage,
        metrics.memory_usage,
        metrics.active_connections,
        analysis.probability,
        analysis.needs_optimization
      )?;
    }
  }

  Ok(())
}

fn init_logging() {
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new("warn"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(true)
    .with_writer(std::io::stderr)
    .init();
}
