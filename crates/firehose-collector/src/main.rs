//! firehose-collector binary.
//!
//! Reads `collector.toml` (or the path given with `--config`) layered under
//! `FIREHOSE_*` environment variables, opens the collections, and runs the
//! poller and the accumulator until Ctrl-C. On shutdown the poller stops,
//! which closes the channel and lets the accumulator flush what it holds.
//!
//! Logs go to stdout and to `log_file` (default `log.log`, truncated).

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use firehose_collector::{
  BatchAccumulator, CollectorConfig, EnrichmentClient, GithubEventSource,
  HttpTransport, MultiSink, Pipeline, logging, run_poller,
};
use firehose_store_sqlite::open_collections;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(author, version, about = "Firehose event collector")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "collector.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  let cfg = CollectorConfig::load(&cli.config)
    .with_context(|| format!("failed to load {}", cli.config.display()))?;

  logging::init(cfg.log_file.as_deref()).context("failed to open log file")?;

  let collections = open_collections(&cfg.store())
    .await
    .context("failed to open collections")?;

  let transport =
    HttpTransport::new(&cfg.graphql_url, &cfg.github_token, cfg.graphql_timeout())
      .context("failed to build enrichment client")?;
  let source = GithubEventSource::new(&cfg.events_url, &cfg.github_token)
    .context("failed to build event feed client")?;

  let pipeline = Pipeline::new(
    EnrichmentClient::new(transport),
    MultiSink::new(collections),
  );

  let accumulator_cfg = cfg.accumulator();
  let (tx, rx) = mpsc::channel(accumulator_cfg.max_items.max(100));
  let accumulator =
    tokio::spawn(BatchAccumulator::new(pipeline, accumulator_cfg).run(rx));

  tracing::info!("collector started");
  tokio::select! {
    _ = run_poller(source, tx, cfg.fetch_interval()) => {}
    res = tokio::signal::ctrl_c() => {
      res.context("failed to listen for shutdown signal")?;
      tracing::info!("shutting down");
    }
  }

  // The poller (and with it the sender) is dropped by now.
  accumulator.await.context("accumulator task failed")?;
  Ok(())
}
