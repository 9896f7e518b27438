//! Persisting one flushed batch into the three collections.

use std::collections::HashMap;

use firehose_core::{
  actor::ActorSummary,
  collection::{CollectionKind, Collections},
  event::ActivityRecord,
  store::{CollectionStore, Document, DocumentKey},
  subject::EnrichedSubject,
};

use crate::error::SinkError;

// ─── Report ──────────────────────────────────────────────────────────────────

/// Outcome of one [`MultiSink::save`]; `None` means the write succeeded or
/// was skipped.
#[derive(Debug, Default)]
pub struct FlushReport {
  pub events: Option<SinkError>,
  pub repos:  Option<SinkError>,
  pub users:  Option<SinkError>,
}

impl FlushReport {
  pub fn failures(&self) -> impl Iterator<Item = &SinkError> {
    [&self.events, &self.repos, &self.users].into_iter().flatten()
  }

  pub fn is_clean(&self) -> bool { self.failures().next().is_none() }
}

// ─── Sink ────────────────────────────────────────────────────────────────────

/// Writes records, subjects and actors to their collections concurrently.
#[derive(Debug, Clone)]
pub struct MultiSink<E, R, U> {
  collections: Collections<E, R, U>,
}

impl<E, R, U> MultiSink<E, R, U>
where
  E: CollectionStore<Document = ActivityRecord>,
  R: CollectionStore<Document = EnrichedSubject>,
  U: CollectionStore<Document = ActorSummary>,
{
  pub fn new(collections: Collections<E, R, U>) -> Self { Self { collections } }

  pub fn collections(&self) -> &Collections<E, R, U> { &self.collections }

  /// Persist one batch.
  ///
  /// Records are inserted (already-stored ids are ignored), subjects and
  /// actor summaries are upserted. The three writes run concurrently and
  /// this returns once all of them have completed; a failure in one never
  /// cancels the others.
  pub async fn save(
    &self,
    records: &[ActivityRecord],
    subjects: Vec<EnrichedSubject>,
  ) -> FlushReport {
    let actors = actors_by_key(records);
    let subjects = by_key(subjects);

    let (events, repos, users) = tokio::join!(
      self.save_events(records.to_vec()),
      self.save_repos(subjects),
      self.save_users(actors),
    );

    let report = FlushReport {
      events: events.err(),
      repos:  repos.err(),
      users:  users.err(),
    };
    for failure in report.failures() {
      tracing::error!(
        collection = %failure.collection,
        error = %failure.source,
        "failed to persist batch"
      );
    }
    report
  }

  async fn save_events(&self, records: Vec<ActivityRecord>) -> Result<(), SinkError> {
    if records.is_empty() {
      return Ok(());
    }
    let count = records.len();
    let Err(err) = self.collections.events.store.insert_many(records).await else {
      tracing::debug!(count, "saved events");
      return Ok(());
    };

    let failed = err.failures.len();
    match err.without(E::is_duplicate_key) {
      None => {
        tracing::debug!(count, duplicates = failed, "saved events");
        Ok(())
      }
      Some(remaining) => Err(SinkError::new(CollectionKind::Events, remaining)),
    }
  }

  async fn save_repos(
    &self,
    subjects: HashMap<DocumentKey, EnrichedSubject>,
  ) -> Result<(), SinkError> {
    if subjects.is_empty() {
      return Ok(());
    }
    let count = subjects.len();
    self
      .collections
      .repos
      .store
      .upsert_by_id(subjects)
      .await
      .map_err(|e| SinkError::new(CollectionKind::Repos, e))?;
    tracing::debug!(count, "saved subjects");
    Ok(())
  }

  async fn save_users(
    &self,
    actors: HashMap<DocumentKey, ActorSummary>,
  ) -> Result<(), SinkError> {
    if actors.is_empty() {
      return Ok(());
    }
    let count = actors.len();
    self
      .collections
      .users
      .store
      .upsert_by_id(actors)
      .await
      .map_err(|e| SinkError::new(CollectionKind::Users, e))?;
    tracing::debug!(count, "saved actors");
    Ok(())
  }
}

// ─── Keying ──────────────────────────────────────────────────────────────────

/// Key documents by id; a later document replaces an earlier one.
fn by_key<D: Document>(docs: impl IntoIterator<Item = D>) -> HashMap<DocumentKey, D> {
  docs.into_iter().map(|d| (d.key(), d)).collect()
}

/// One summary per actor, taken from the actor's last record in batch order.
pub fn actors_by_key(records: &[ActivityRecord]) -> HashMap<DocumentKey, ActorSummary> {
  by_key(records.iter().map(ActorSummary::from))
}
