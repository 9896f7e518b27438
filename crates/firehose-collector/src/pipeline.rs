//! The production [`BatchHandler`]: enrich a batch, then persist it.

use firehose_core::{
  actor::ActorSummary, event::ActivityRecord, store::CollectionStore,
  subject::EnrichedSubject,
};

use crate::{
  accumulator::{Batch, BatchHandler},
  enrich::EnrichmentClient,
  sink::MultiSink,
  transport::EnrichmentTransport,
};

pub struct Pipeline<T, E, R, U> {
  enricher: EnrichmentClient<T>,
  sink:     MultiSink<E, R, U>,
}

impl<T, E, R, U> Pipeline<T, E, R, U> {
  pub fn new(enricher: EnrichmentClient<T>, sink: MultiSink<E, R, U>) -> Self {
    Self { enricher, sink }
  }

  pub fn sink(&self) -> &MultiSink<E, R, U> { &self.sink }
}

impl<T, E, R, U> BatchHandler for Pipeline<T, E, R, U>
where
  T: EnrichmentTransport,
  E: CollectionStore<Document = ActivityRecord>,
  R: CollectionStore<Document = EnrichedSubject>,
  U: CollectionStore<Document = ActorSummary>,
{
  async fn flush(&self, batch: Batch) {
    let records = batch.records();

    // Records and actors are still worth keeping without their subjects.
    let subjects = match self.enricher.enrich(records).await {
      Ok(subjects) => subjects,
      Err(e) => {
        tracing::error!(error = %e, records = records.len(), "failed to enrich batch");
        Vec::new()
      }
    };

    let report = self.sink.save(records, subjects).await;
    if report.is_clean() {
      tracing::debug!(records = records.len(), "batch persisted");
    }
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use chrono::{DateTime, TimeZone, Utc};
  use firehose_core::{
    event::{ActorRef, SubjectRef},
    store::{OrderBy, SortOrder},
  };
  use firehose_store_sqlite::{SqliteCollections, open_collections_in_memory};
  use tokio::sync::mpsc;

  use super::*;
  use crate::{
    accumulator::{AccumulatorConfig, BatchAccumulator},
    error::EnrichError,
    transport::GraphQlRequest,
  };

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  fn record(id: &str, subject: &str, actor: i64, secs: i64) -> ActivityRecord {
    ActivityRecord {
      id:         id.into(),
      kind:       "PushEvent".into(),
      created_at: at(secs),
      public:     true,
      subject:    SubjectRef {
        full_name: subject.into(),
        url:       format!("https://api.github.com/repos/{subject}"),
      },
      actor:      ActorRef {
        id:         actor,
        login:      format!("user{actor}-{id}"),
        url:        format!("https://api.github.com/users/user{actor}"),
        avatar_url: format!("https://avatars.example/{actor}"),
      },
    }
  }

  /// Answers with both `a/b` and `c/d`, or fails when `fail` is set.
  struct StaticTransport {
    fail: bool,
  }

  impl EnrichmentTransport for StaticTransport {
    async fn send(&self, _request: &GraphQlRequest) -> Result<Vec<u8>, EnrichError> {
      if self.fail {
        return Err(EnrichError::Timeout);
      }
      Ok(
        br#"{"data":{
          "subject0":{"id":"R_ab","name":"b","owner":{"login":"a"},"url":"https://github.com/a/b","stargazerCount":1},
          "subject1":{"id":"R_cd","name":"d","owner":{"login":"c"},"url":"https://github.com/c/d","stargazerCount":2}
        }}"#
          .to_vec(),
      )
    }
  }

  async fn pipeline(
    fail: bool,
  ) -> Pipeline<
    StaticTransport,
    firehose_store_sqlite::SqliteCollection<ActivityRecord>,
    firehose_store_sqlite::SqliteCollection<EnrichedSubject>,
    firehose_store_sqlite::SqliteCollection<ActorSummary>,
  > {
    let collections: SqliteCollections = open_collections_in_memory().await.unwrap();
    Pipeline::new(
      EnrichmentClient::new(StaticTransport { fail }),
      MultiSink::new(collections),
    )
  }

  fn batch() -> Vec<ActivityRecord> {
    vec![
      record("e1", "a/b", 1, 10),
      record("e2", "a/b", 1, 20),
      record("e3", "c/d", 2, 15),
    ]
  }

  #[tokio::test(start_paused = true)]
  async fn one_full_batch_is_enriched_and_persisted() {
    let (tx, rx) = mpsc::channel(8);
    let config = AccumulatorConfig { max_items: 3, max_idle: Duration::from_secs(10) };

    // The accumulator consumes the handler, so collections are shared through
    // a clone of the sink.
    let pipeline = pipeline(false).await;
    let collections = pipeline.sink().collections().clone();
    let task = tokio::spawn(BatchAccumulator::new(pipeline, config).run(rx));

    for r in batch() {
      tx.send(r).await.unwrap();
    }
    drop(tx);
    task.await.unwrap();

    assert_eq!(collections.events.store.count().await.unwrap(), 3);

    let repos = collections.repos.store.find(0, &OrderBy::default()).await.unwrap();
    assert_eq!(repos.len(), 2);
    assert_eq!((repos[0].id.as_str(), repos[0].last_updated_at), ("R_ab", at(20)));
    assert_eq!((repos[1].id.as_str(), repos[1].last_updated_at), ("R_cd", at(15)));

    let order = OrderBy { column: "id".into(), direction: SortOrder::Ascending };
    let users = collections.users.store.find(0, &order).await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id, 1);
    assert_eq!(users[0].login, "user1-e2");
    assert_eq!(users[0].last_updated_at, at(20));
    assert_eq!(users[1].id, 2);
    assert_eq!(users[1].login, "user2-e3");
  }

  #[tokio::test]
  async fn enrichment_failure_still_persists_records_and_actors() {
    let pipeline = pipeline(true).await;
    pipeline.flush(Batch::from(batch())).await;

    let c = pipeline.sink().collections();
    assert_eq!(c.events.store.count().await.unwrap(), 3);
    assert_eq!(c.repos.store.count().await.unwrap(), 0);
    assert_eq!(c.users.store.count().await.unwrap(), 2);
  }
}
