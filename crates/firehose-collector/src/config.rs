//! Collector configuration.
//!
//! Loaded from an optional TOML file layered under `FIREHOSE_*` environment
//! variables, e.g. `FIREHOSE_GITHUB_TOKEN`, `FIREHOSE_MAX_ITEMS`.

use std::{path::{Path, PathBuf}, time::Duration};

use firehose_store_sqlite::StoreConfig;
use serde::Deserialize;

use crate::{accumulator::AccumulatorConfig, error::ConfigError};

/// Prefix of the environment variables read by [`CollectorConfig::load`].
pub const ENV_PREFIX: &str = "FIREHOSE";

/// Runtime collector configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
  /// Credential for both the event feed and the enrichment endpoint.
  pub github_token:         String,
  pub events_url:           String,
  pub graphql_url:          String,
  pub graphql_timeout_secs: u64,
  pub fetch_interval_secs:  u64,
  /// Flush as soon as this many records are buffered.
  pub max_items:            usize,
  /// Flush a non-empty buffer after this long without a flush.
  pub max_idle_secs:        u64,
  pub events_db:            PathBuf,
  pub events_collection:    String,
  pub repos_db:             PathBuf,
  pub repos_collection:     String,
  pub users_db:             PathBuf,
  pub users_collection:     String,
  /// Plain-text log file, truncated on start. `None` logs to stdout only.
  pub log_file:             Option<PathBuf>,
}

impl Default for CollectorConfig {
  fn default() -> Self {
    let store = StoreConfig::default();
    Self {
      github_token:         String::new(),
      events_url:           "https://api.github.com/events".to_owned(),
      graphql_url:          "https://api.github.com/graphql".to_owned(),
      graphql_timeout_secs: 30,
      fetch_interval_secs:  60,
      max_items:            3,
      max_idle_secs:        10,
      events_db:            store.events_db,
      events_collection:    store.events_collection,
      repos_db:             store.repos_db,
      repos_collection:     store.repos_collection,
      users_db:             store.users_db,
      users_collection:     store.users_collection,
      log_file:             Some(PathBuf::from("log.log")),
    }
  }
}

impl CollectorConfig {
  /// Read `path` (if it exists) and the environment, then validate.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()?;

    let cfg: CollectorConfig = settings.try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.github_token.trim().is_empty() {
      return Err(ConfigError::MissingCredential("FIREHOSE_GITHUB_TOKEN"));
    }
    if self.max_items == 0 {
      return Err(ConfigError::Invalid("max_items must be at least 1".into()));
    }
    if self.max_idle_secs == 0 {
      return Err(ConfigError::Invalid(
        "max_idle_secs must be at least 1".into(),
      ));
    }
    Ok(())
  }

  pub fn accumulator(&self) -> AccumulatorConfig {
    AccumulatorConfig {
      max_items: self.max_items,
      max_idle:  Duration::from_secs(self.max_idle_secs),
    }
  }

  pub fn graphql_timeout(&self) -> Duration {
    Duration::from_secs(self.graphql_timeout_secs)
  }

  pub fn fetch_interval(&self) -> Duration {
    Duration::from_secs(self.fetch_interval_secs)
  }

  pub fn store(&self) -> StoreConfig {
    StoreConfig {
      events_db:         self.events_db.clone(),
      events_collection: self.events_collection.clone(),
      repos_db:          self.repos_db.clone(),
      repos_collection:  self.repos_collection.clone(),
      users_db:          self.users_db.clone(),
      users_collection:  self.users_collection.clone(),
    }
  }
}
