//! firehose-api server binary.
//!
//! Reads `api.toml` (or the path given with `--config`) layered under
//! `FIREHOSE_*` environment variables, opens the collections, and serves the
//! query API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use firehose_api::ApiConfig;
use firehose_store_sqlite::open_collections;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Firehose query API")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "api.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("FIREHOSE"))
    .build()
    .context("failed to read config file")?;

  let cfg: ApiConfig = settings
    .try_deserialize()
    .context("failed to deserialise ApiConfig")?;

  let collections = open_collections(&cfg.store())
    .await
    .context("failed to open collections")?;

  let app = firehose_api::api_router(Arc::new(collections));
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
