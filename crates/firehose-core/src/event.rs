//! Activity records — the raw unit ingested from the public feed.
//!
//! A record is immutable once received. It is appended to the events
//! collection verbatim and is the source from which subjects and actors are
//! derived at flush time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, subject::SubjectIdentifier};

// ─── References ──────────────────────────────────────────────────────────────

/// The subject (repository) an activity refers to, as reported by the feed.
///
/// `full_name` is kept as the raw `"owner/name"` string; it is only parsed
/// into a [`SubjectIdentifier`] when a lookup key is needed, so a malformed
/// value never prevents the record itself from being stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRef {
  pub full_name: String,
  pub url:       String,
}

impl SubjectRef {
  pub fn identifier(&self) -> Result<SubjectIdentifier> {
    self.full_name.parse()
  }
}

/// The actor (user) that performed an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRef {
  pub id:         i64,
  pub login:      String,
  pub url:        String,
  pub avatar_url: String,
}

// ─── ActivityRecord ──────────────────────────────────────────────────────────

/// One public activity event. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
  pub id:         String,
  /// Event type as reported by the feed, e.g. `"PushEvent"`.
  #[serde(rename = "type")]
  pub kind:       String,
  #[serde(with = "crate::timestamp")]
  pub created_at: DateTime<Utc>,
  pub public:     bool,
  pub subject:    SubjectRef,
  pub actor:      ActorRef,
}
