//! Subjects — the repositories referenced by activity records.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

// ─── SubjectIdentifier ───────────────────────────────────────────────────────

/// An `(owner, name)` pair parsed from an `"owner/name"` string.
///
/// Used only as a lookup key; never persisted on its own. Both parts are
/// guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectIdentifier {
  owner: String,
  name:  String,
}

impl SubjectIdentifier {
  pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
    Self { owner: owner.into(), name: name.into() }
  }

  pub fn owner(&self) -> &str { &self.owner }

  pub fn name(&self) -> &str { &self.name }
}

impl FromStr for SubjectIdentifier {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.split_once('/') {
      Some((owner, name))
        if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
      {
        Ok(Self::new(owner, name))
      }
      _ => Err(Error::MalformedSubject(s.to_owned())),
    }
  }
}

impl fmt::Display for SubjectIdentifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.owner, self.name)
  }
}

// ─── EnrichedSubject ─────────────────────────────────────────────────────────

/// A subject with the attributes fetched by the enrichment lookup.
///
/// `last_updated_at` is the latest activity timestamp seen for this subject
/// in the batch that produced it, or the Unix epoch when the lookup returned
/// an owner/name that could not be matched back to the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedSubject {
  /// Stable identifier assigned by the enrichment source.
  pub id:              String,
  pub owner:           String,
  pub name:            String,
  pub url:             String,
  /// Popularity metric (stargazer count).
  pub stars:           i64,
  #[serde(with = "crate::timestamp")]
  pub last_updated_at: DateTime<Utc>,
}
