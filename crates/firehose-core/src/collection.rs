//! The set of logical collections, built once at startup and passed to the
//! components that read or write them.

use strum::IntoEnumIterator;

use crate::{
  Error, Result,
  actor::ActorSummary,
  event::ActivityRecord,
  store::CollectionStore,
  subject::EnrichedSubject,
};

/// The three logical collections the pipeline writes.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  strum::Display,
  strum::EnumIter,
  strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum CollectionKind {
  /// Append-only activity records.
  Events,
  /// Enriched subjects, upserted by id.
  Repos,
  /// Actor summaries, upserted by id.
  Users,
}

/// A store handle together with its configured collection name.
#[derive(Debug, Clone)]
pub struct Collection<S> {
  pub name:  String,
  pub store: S,
}

impl<S> Collection<S> {
  pub fn new(name: impl Into<String>, store: S) -> Self {
    Self { name: name.into(), store }
  }
}

/// Explicit registry of the three collection handles.
///
/// Cloning is as cheap as cloning the three stores.
#[derive(Debug, Clone)]
pub struct Collections<E, R, U> {
  pub events: Collection<E>,
  pub repos:  Collection<R>,
  pub users:  Collection<U>,
}

impl<E, R, U> Collections<E, R, U>
where
  E: CollectionStore<Document = ActivityRecord>,
  R: CollectionStore<Document = EnrichedSubject>,
  U: CollectionStore<Document = ActorSummary>,
{
  pub fn name_of(&self, kind: CollectionKind) -> &str {
    match kind {
      CollectionKind::Events => &self.events.name,
      CollectionKind::Repos => &self.repos.name,
      CollectionKind::Users => &self.users.name,
    }
  }

  /// Configured collection names, in [`CollectionKind`] order.
  pub fn names(&self) -> Vec<&str> {
    CollectionKind::iter().map(|k| self.name_of(k)).collect()
  }

  /// Resolve a configured collection name to its kind.
  pub fn resolve(&self, name: &str) -> Result<CollectionKind> {
    CollectionKind::iter()
      .find(|k| self.name_of(*k) == name)
      .ok_or_else(|| Error::UnknownCollection {
        name:      name.to_owned(),
        supported: self.names().join(", "),
      })
  }
}
