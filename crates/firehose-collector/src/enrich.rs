//! Subject enrichment: one batched repository lookup per flushed batch.
//!
//! The batch is reduced to its distinct subjects (each with the latest
//! activity timestamp seen for it), those subjects are requested in a single
//! aliased query, and the response is merged back into [`EnrichedSubject`]s.

use std::{
  collections::{HashMap, hash_map::Entry},
  fmt::Write as _,
};

use chrono::{DateTime, Utc};
use firehose_core::{
  event::ActivityRecord,
  subject::{EnrichedSubject, SubjectIdentifier},
};
use serde::Deserialize;

use crate::{
  error::EnrichError,
  transport::{EnrichmentTransport, GraphQlRequest},
};

/// Positional aliases are `subject0`, `subject1`, ... in first-seen order.
pub const ALIAS_PREFIX: &str = "subject";

// ─── Client ──────────────────────────────────────────────────────────────────

/// Fetches supplementary subject attributes for a batch of records.
pub struct EnrichmentClient<T> {
  transport: T,
}

impl<T: EnrichmentTransport> EnrichmentClient<T> {
  pub fn new(transport: T) -> Self { Self { transport } }

  /// Enrich every distinct, well-formed subject referenced by `records`.
  ///
  /// Fails as a whole on transport or decode errors, and when the endpoint
  /// answers with errors but no data. Per-subject errors reported alongside
  /// data are logged and those subjects are left out.
  pub async fn enrich(
    &self,
    records: &[ActivityRecord],
  ) -> Result<Vec<EnrichedSubject>, EnrichError> {
    let last_seen = LastSeen::from_records(records);
    if last_seen.is_empty() {
      tracing::debug!("no subjects to enrich");
      return Ok(Vec::new());
    }

    tracing::debug!(subjects = last_seen.len(), "fetching subjects");
    let request = build_query(last_seen.subjects());
    let body = self.transport.send(&request).await?;
    parse_response(&body, &last_seen)
  }
}

// ─── Last-seen timestamps ────────────────────────────────────────────────────

/// The latest activity timestamp of every distinct subject in a batch,
/// remembering the order in which subjects were first seen.
#[derive(Debug, Default)]
pub struct LastSeen {
  order:  Vec<SubjectIdentifier>,
  latest: HashMap<SubjectIdentifier, DateTime<Utc>>,
}

impl LastSeen {
  pub fn from_records(records: &[ActivityRecord]) -> Self {
    let mut seen = Self::default();
    for record in records {
      let id = match record.subject.identifier() {
        Ok(id) => id,
        Err(e) => {
          tracing::warn!(record = %record.id, error = %e, "skipping subject");
          continue;
        }
      };
      match seen.latest.entry(id) {
        Entry::Vacant(slot) => {
          seen.order.push(slot.key().clone());
          slot.insert(record.created_at);
        }
        Entry::Occupied(mut slot) => {
          if record.created_at > *slot.get() {
            slot.insert(record.created_at);
          }
        }
      }
    }
    seen
  }

  /// Distinct subjects in first-seen order.
  pub fn subjects(&self) -> &[SubjectIdentifier] { &self.order }

  pub fn get(&self, id: &SubjectIdentifier) -> Option<DateTime<Utc>> {
    self.latest.get(id).copied()
  }

  pub fn len(&self) -> usize { self.order.len() }

  pub fn is_empty(&self) -> bool { self.order.is_empty() }
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// Build one query asking for every subject under its positional alias.
pub fn build_query(subjects: &[SubjectIdentifier]) -> GraphQlRequest {
  let mut query = String::from("query {");
  for (i, subject) in subjects.iter().enumerate() {
    // Writing to a String cannot fail.
    let _ = write!(
      query,
      " {ALIAS_PREFIX}{i}: repository(owner: {}, name: {}) \
       {{ id name owner {{ login }} url stargazerCount }}",
      string_literal(subject.owner()),
      string_literal(subject.name()),
    );
  }
  query.push_str(" }");
  GraphQlRequest { query }
}

/// A double-quoted, escaped string literal.
fn string_literal(s: &str) -> String {
  serde_json::Value::from(s).to_string()
}

// ─── Response ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct QueryResponse {
  #[serde(default)]
  data:   Option<HashMap<String, Option<SubjectData>>>,
  #[serde(default)]
  errors: Option<Vec<QueryError>>,
}

#[derive(Debug, Deserialize)]
struct QueryError {
  #[serde(default)]
  message: String,
}

#[derive(Debug, Deserialize)]
struct SubjectData {
  id:    String,
  name:  String,
  owner: OwnerData,
  url:   String,
  #[serde(rename = "stargazerCount")]
  stars: i64,
}

#[derive(Debug, Deserialize)]
struct OwnerData {
  login: String,
}

impl SubjectData {
  fn into_subject(self, last_seen: &LastSeen) -> EnrichedSubject {
    let identifier = SubjectIdentifier::new(&self.owner.login, &self.name);
    // A renamed subject comes back under its new owner/name and so has no
    // timestamp from this batch.
    let last_updated_at = last_seen.get(&identifier).unwrap_or_else(|| {
      tracing::debug!(subject = %identifier, "no activity timestamp for subject");
      DateTime::<Utc>::UNIX_EPOCH
    });

    EnrichedSubject {
      id: self.id,
      owner: self.owner.login,
      name: self.name,
      url: self.url,
      stars: self.stars,
      last_updated_at,
    }
  }
}

fn parse_response(
  body: &[u8],
  last_seen: &LastSeen,
) -> Result<Vec<EnrichedSubject>, EnrichError> {
  let response: QueryResponse = serde_json::from_slice(body)?;

  let errors = response.errors.unwrap_or_default();
  if !errors.is_empty() {
    let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    let messages = messages.join(", ");
    // Without a data object the whole query was rejected, not some aliases.
    if response.data.is_none() {
      return Err(EnrichError::Query(messages));
    }
    tracing::warn!(
      failed = errors.len(),
      errors = %messages,
      "failed to fetch some subjects"
    );
  }

  Ok(
    response
      .data
      .unwrap_or_default()
      .into_values()
      .flatten()
      .map(|data| data.into_subject(last_seen))
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use chrono::TimeZone;
  use firehose_core::event::{ActorRef, SubjectRef};

  use super::*;

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  fn record(id: &str, subject: &str, secs: i64) -> ActivityRecord {
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
        id:         1,
        login:      "octocat".into(),
        url:        "https://api.github.com/users/octocat".into(),
        avatar_url: "https://avatars.example/1".into(),
      },
    }
  }

  /// Replays a canned response and records every request it receives.
  struct FakeTransport {
    response: Result<String, u16>,
    requests: Mutex<Vec<GraphQlRequest>>,
  }

  impl FakeTransport {
    fn replying(body: &str) -> Self {
      Self { response: Ok(body.to_owned()), requests: Mutex::new(Vec::new()) }
    }

    fn failing(status: u16) -> Self {
      Self { response: Err(status), requests: Mutex::new(Vec::new()) }
    }

    fn sent(&self) -> Vec<GraphQlRequest> { self.requests.lock().unwrap().clone() }
  }

  impl EnrichmentTransport for FakeTransport {
    async fn send(&self, request: &GraphQlRequest) -> Result<Vec<u8>, EnrichError> {
      self.requests.lock().unwrap().push(request.clone());
      match &self.response {
        Ok(body) => Ok(body.clone().into_bytes()),
        Err(status) => Err(EnrichError::Status {
          status: *status,
          body:   "unavailable".into(),
        }),
      }
    }
  }

  fn repo_json(id: &str, owner: &str, name: &str, stars: i64) -> String {
    format!(
      r#"{{"id":"{id}","name":"{name}","owner":{{"login":"{owner}"}},"url":"https://github.com/{owner}/{name}","stargazerCount":{stars}}}"#
    )
  }

  // ── LastSeen ──────────────────────────────────────────────────────────────

  #[test]
  fn last_seen_keeps_the_maximum_timestamp() {
    let records = vec![
      record("e1", "a/b", 1),
      record("e2", "c/d", 2),
      record("e3", "a/b", 3),
      record("e4", "a/b", 2),
    ];
    let seen = LastSeen::from_records(&records);

    let ab = SubjectIdentifier::new("a", "b");
    let cd = SubjectIdentifier::new("c", "d");
    assert_eq!(seen.subjects(), &[ab.clone(), cd.clone()]);
    assert_eq!(seen.get(&ab), Some(at(3)));
    assert_eq!(seen.get(&cd), Some(at(2)));
  }

  #[test]
  fn last_seen_skips_malformed_subjects() {
    let records = vec![record("e1", "ab", 5), record("e2", "c/d", 6)];
    let seen = LastSeen::from_records(&records);
    assert_eq!(seen.subjects(), &[SubjectIdentifier::new("c", "d")]);
  }

  // ── Request ───────────────────────────────────────────────────────────────

  #[test]
  fn query_requests_each_distinct_subject_once() {
    let records = vec![
      record("e1", "a/b", 1),
      record("e2", "a/b", 2),
      record("e3", "c/d", 3),
    ];
    let query = build_query(LastSeen::from_records(&records).subjects()).query;

    assert!(query.starts_with("query {"));
    assert!(query.contains(r#"subject0: repository(owner: "a", name: "b")"#));
    assert!(query.contains(r#"subject1: repository(owner: "c", name: "d")"#));
    assert!(!query.contains("subject2"));
    assert_eq!(query.matches("stargazerCount").count(), 2);
  }

  #[test]
  fn query_escapes_string_literals() {
    let query = build_query(&[SubjectIdentifier::new("we\"ird", "x")]).query;
    assert!(query.contains(r#"owner: "we\"ird""#), "{query}");
  }

  // ── enrich ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn enrich_attaches_latest_timestamps() {
    let body = format!(
      r#"{{"data":{{"subject0":{},"subject1":{}}}}}"#,
      repo_json("R_ab", "a", "b", 10),
      repo_json("R_cd", "c", "d", 3),
    );
    let client = EnrichmentClient::new(FakeTransport::replying(&body));
    let records = vec![
      record("e1", "a/b", 10),
      record("e2", "a/b", 20),
      record("e3", "c/d", 15),
    ];

    let mut subjects = client.enrich(&records).await.unwrap();
    subjects.sort_by(|a, b| a.id.cmp(&b.id));

    assert_eq!(subjects.len(), 2);
    assert_eq!(subjects[0].id, "R_ab");
    assert_eq!(subjects[0].stars, 10);
    assert_eq!(subjects[0].last_updated_at, at(20));
    assert_eq!(subjects[1].id, "R_cd");
    assert_eq!(subjects[1].last_updated_at, at(15));
    assert_eq!(client.transport.sent().len(), 1);
  }

  #[tokio::test]
  async fn renamed_subject_gets_the_zero_timestamp() {
    let body = format!(
      r#"{{"data":{{"subject0":{}}}}}"#,
      repo_json("R_1", "new-owner", "b", 1),
    );
    let client = EnrichmentClient::new(FakeTransport::replying(&body));

    let subjects = client.enrich(&[record("e1", "a/b", 50)]).await.unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].last_updated_at, DateTime::<Utc>::UNIX_EPOCH);
  }

  #[tokio::test]
  async fn partial_errors_drop_only_the_failed_subjects() {
    let body = format!(
      r#"{{"data":{{"subject0":{},"subject1":null}},
          "errors":[{{"type":"NOT_FOUND","path":["subject1"],
                      "message":"Could not resolve to a Repository with the name 'c/d'."}}]}}"#,
      repo_json("R_ab", "a", "b", 1),
    );
    let client = EnrichmentClient::new(FakeTransport::replying(&body));

    let subjects = client
      .enrich(&[record("e1", "a/b", 1), record("e2", "c/d", 2)])
      .await
      .unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].id, "R_ab");
  }

  #[tokio::test]
  async fn empty_data_yields_no_subjects() {
    let client = EnrichmentClient::new(FakeTransport::replying(r#"{"data":{}}"#));
    let subjects = client
      .enrich(&[record("e1", "a/b", 1), record("e2", "c/d", 2)])
      .await
      .unwrap();
    assert!(subjects.is_empty());
  }

  #[tokio::test]
  async fn query_level_errors_without_data_fail_the_batch() {
    let body = r#"{"data":null,"errors":[{"type":"RATE_LIMITED","message":"API rate limit exceeded"}]}"#;
    let client = EnrichmentClient::new(FakeTransport::replying(body));

    let err = client.enrich(&[record("e1", "a/b", 1)]).await.unwrap_err();
    assert!(
      matches!(&err, EnrichError::Query(m) if m == "API rate limit exceeded"),
      "{err}"
    );

    let client = EnrichmentClient::new(FakeTransport::replying(
      r#"{"errors":[{"message":"Parse error"}]}"#,
    ));
    let err = client.enrich(&[record("e1", "a/b", 1)]).await.unwrap_err();
    assert!(matches!(err, EnrichError::Query(_)));
  }

  #[tokio::test]
  async fn malformed_response_is_an_error() {
    let client = EnrichmentClient::new(FakeTransport::replying("hello world"));
    let err = client
      .enrich(&[record("e1", "a/b", 1), record("e2", "c/d", 2)])
      .await
      .unwrap_err();
    assert!(matches!(err, EnrichError::Decode(_)));
  }

  #[tokio::test]
  async fn endpoint_failure_is_an_error() {
    let client = EnrichmentClient::new(FakeTransport::failing(502));
    let err = client.enrich(&[record("e1", "a/b", 1)]).await.unwrap_err();
    assert!(matches!(err, EnrichError::Status { status: 502, .. }));
  }

  #[tokio::test]
  async fn batch_without_valid_subjects_sends_nothing() {
    let client = EnrichmentClient::new(FakeTransport::replying(r#"{"data":{}}"#));
    let subjects = client.enrich(&[record("e1", "nope", 1)]).await.unwrap();
    assert!(subjects.is_empty());
    assert!(client.transport.sent().is_empty());
  }
}
