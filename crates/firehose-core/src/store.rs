//! The `CollectionStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g. `firehose-store-sqlite`).
//! The collector's sink and the query API depend on this abstraction, not on
//! any concrete backend.

use std::{collections::HashMap, fmt, future::Future};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::{
  actor::ActorSummary, event::ActivityRecord, subject::EnrichedSubject,
};

// ─── Documents ───────────────────────────────────────────────────────────────

/// The primary key of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentKey {
  Text(String),
  Integer(i64),
}

impl fmt::Display for DocumentKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Text(s) => f.write_str(s),
      Self::Integer(i) => write!(f, "{i}"),
    }
  }
}

/// A record type that can live in a collection.
pub trait Document:
  Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
  /// Persisted field paths that may be used in [`OrderBy::column`], besides
  /// the key column `id`. Nested fields use dotted paths.
  const FIELDS: &'static [&'static str];

  fn key(&self) -> DocumentKey;
}

impl Document for ActivityRecord {
  const FIELDS: &'static [&'static str] = &[
    "type",
    "created_at",
    "public",
    "subject.full_name",
    "subject.url",
    "actor.id",
    "actor.login",
    "actor.url",
    "actor.avatar_url",
  ];

  fn key(&self) -> DocumentKey { DocumentKey::Text(self.id.clone()) }
}

impl Document for EnrichedSubject {
  const FIELDS: &'static [&'static str] =
    &["owner", "name", "url", "stars", "last_updated_at"];

  fn key(&self) -> DocumentKey { DocumentKey::Text(self.id.clone()) }
}

impl Document for ActorSummary {
  const FIELDS: &'static [&'static str] =
    &["login", "url", "avatar_url", "last_updated_at"];

  fn key(&self) -> DocumentKey { DocumentKey::Integer(self.id) }
}

// ─── Query types ─────────────────────────────────────────────────────────────

/// The name of the key column, always sortable.
pub const KEY_COLUMN: &str = "id";

/// Sort direction for [`CollectionStore::find`].
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
  #[default]
  Ascending,
  Descending,
}

/// Column and direction for [`CollectionStore::find`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
  pub column:    String,
  pub direction: SortOrder,
}

impl Default for OrderBy {
  fn default() -> Self {
    Self { column: KEY_COLUMN.to_owned(), direction: SortOrder::Ascending }
  }
}

// ─── Bulk write errors ───────────────────────────────────────────────────────

/// A single failed element of a bulk write.
#[derive(Debug)]
pub struct WriteFailure<E> {
  /// Position of the failed element in the submitted batch, when the failure
  /// is attributable to one element.
  pub index: Option<usize>,
  pub error: E,
}

/// The failures of an unordered bulk insert. Elements not listed here were
/// written.
#[derive(Debug, Error)]
#[error("{} of {} writes failed", .failures.len(), .attempted)]
pub struct BulkWriteError<E: fmt::Debug> {
  pub attempted: usize,
  pub failures:  Vec<WriteFailure<E>>,
}

impl<E: fmt::Debug> BulkWriteError<E> {
  /// A failure of the whole operation (e.g. the connection was lost).
  pub fn whole(attempted: usize, error: E) -> Self {
    Self { attempted, failures: vec![WriteFailure { index: None, error }] }
  }

  /// Drop every failure matching `predicate`; `None` if nothing remains.
  pub fn without(mut self, predicate: impl Fn(&E) -> bool) -> Option<Self> {
    self.failures.retain(|f| !predicate(&f.error));
    if self.failures.is_empty() { None } else { Some(self) }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over one logical collection in a storage backend.
///
/// All methods return `Send` futures so handles can be shared by concurrent
/// write tasks and by axum handlers.
pub trait CollectionStore: Send + Sync {
  type Document: Document;
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert every document, unordered: a failing element never prevents the
  /// others from being written.
  fn insert_many(
    &self,
    docs: Vec<Self::Document>,
  ) -> impl Future<Output = Result<(), BulkWriteError<Self::Error>>> + Send + '_;

  /// Insert or replace each document under its key.
  fn upsert_by_id(
    &self,
    docs: HashMap<DocumentKey, Self::Document>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Number of documents in the collection.
  fn count(&self) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Up to `limit` documents (`0` means unlimited) sorted by `order_by`.
  fn find<'a>(
    &'a self,
    limit: u64,
    order_by: &'a OrderBy,
  ) -> impl Future<Output = Result<Vec<Self::Document>, Self::Error>> + Send + 'a;

  /// Whether `error` reports a write rejected because the key already exists.
  fn is_duplicate_key(error: &Self::Error) -> bool;
}
