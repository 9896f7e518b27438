//! Actor summaries derived from activity records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::ActivityRecord;

/// The latest known attributes of an actor, keyed by numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSummary {
  pub id:              i64,
  pub login:           String,
  pub url:             String,
  pub avatar_url:      String,
  /// Timestamp of the record this summary was built from.
  #[serde(with = "crate::timestamp")]
  pub last_updated_at: DateTime<Utc>,
}

impl From<&ActivityRecord> for ActorSummary {
  fn from(record: &ActivityRecord) -> Self {
    Self {
      id:              record.actor.id,
      login:           record.actor.login.clone(),
      url:             record.actor.url.clone(),
      avatar_url:      record.actor.avatar_url.clone(),
      last_updated_at: record.created_at,
    }
  }
}
