//! Error types for `firehose-collector`.

use firehose_core::collection::CollectionKind;
use thiserror::Error;

/// Failure of the enrichment step; fails enrichment for the whole batch.
#[derive(Debug, Error)]
pub enum EnrichError {
  #[error("enrichment request failed: {0}")]
  Transport(#[source] reqwest::Error),

  #[error("enrichment request timed out")]
  Timeout,

  #[error("enrichment endpoint returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("malformed enrichment response: {0}")]
  Decode(#[from] serde_json::Error),

  /// The endpoint answered with errors and no data at all.
  #[error("enrichment query failed: {0}")]
  Query(String),
}

impl From<reqwest::Error> for EnrichError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      EnrichError::Timeout
    } else {
      EnrichError::Transport(err)
    }
  }
}

/// Failure of a single poll of the event feed.
#[derive(Debug, Error)]
pub enum SourceError {
  #[error("event feed request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("event feed returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("malformed event feed page: {0}")]
  Decode(#[from] serde_json::Error),
}

/// A write to one collection failed for reasons other than duplicate keys.
///
/// Never aborts the flush: the other collections are still written.
#[derive(Debug, Error)]
#[error("failed to write {collection}: {source}")]
pub struct SinkError {
  pub collection: CollectionKind,
  #[source]
  pub source:     Box<dyn std::error::Error + Send + Sync>,
}

impl SinkError {
  pub fn new(
    collection: CollectionKind,
    source: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self { collection, source: Box::new(source) }
  }
}

/// Invalid or incomplete configuration; fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("missing required credential: set {0}")]
  MissingCredential(&'static str),

  #[error("invalid configuration: {0}")]
  Invalid(String),

  #[error("failed to load configuration: {0}")]
  Load(#[from] config::ConfigError),
}
