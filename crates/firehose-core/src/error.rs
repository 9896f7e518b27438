//! Error types for `firehose-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed subject identifier: {0:?}")]
  MalformedSubject(String),

  #[error("unknown data type: '{name}'. Supported data types are: {supported}.")]
  UnknownCollection { name: String, supported: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
