//! Error type for `firehose-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// The requested sort column is neither the key nor a persisted field.
  #[error("unknown column: {0:?}")]
  InvalidColumn(String),

  /// Table names must be plain SQL identifiers.
  #[error("invalid collection name: {0:?}")]
  InvalidTable(String),
}

impl Error {
  fn sqlite_failure(&self) -> Option<&rusqlite::ffi::Error> {
    match self {
      Error::Sqlite(rusqlite::Error::SqliteFailure(f, _))
      | Error::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::SqliteFailure(f, _),
      )) => Some(f),
      _ => None,
    }
  }

  /// Whether this error is a primary-key uniqueness violation.
  pub fn is_duplicate_key(&self) -> bool {
    self.sqlite_failure().is_some_and(|f| {
      f.code == rusqlite::ErrorCode::ConstraintViolation
        && f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
