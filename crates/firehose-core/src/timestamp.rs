//! Fixed-width timestamp encoding for stored documents.
//!
//! Documents are sorted by the raw text of their JSON fields, so every
//! timestamp is written as RFC 3339 UTC with exactly three fractional digits
//! and a `Z` suffix. Reading accepts any RFC 3339 form.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(
  value: &DateTime<Utc>,
  serializer: S,
) -> Result<S::Ok, S::Error> {
  serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

pub fn deserialize<'de, D: Deserializer<'de>>(
  deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
  DateTime::<Utc>::deserialize(deserializer)
}
