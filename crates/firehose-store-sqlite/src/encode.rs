//! Encoding helpers between Firehose documents and SQLite columns.
//!
//! Keys are stored with their natural storage class (TEXT or INTEGER).
//! Document bodies are stored as compact JSON; sorting on a document field
//! goes through `json_extract` on a path taken from [`Document::FIELDS`],
//! never from caller text.

use firehose_core::store::{Document, DocumentKey, KEY_COLUMN, OrderBy, SortOrder};
use rusqlite::types::Value;

use crate::{Error, Result};

// ─── Keys ────────────────────────────────────────────────────────────────────

pub fn encode_key(key: DocumentKey) -> Value {
  match key {
    DocumentKey::Text(s) => Value::Text(s),
    DocumentKey::Integer(i) => Value::Integer(i),
  }
}

// ─── Documents ───────────────────────────────────────────────────────────────

pub fn encode_document<D: Document>(doc: &D) -> Result<String> {
  Ok(serde_json::to_string(doc)?)
}

pub fn decode_document<D: Document>(body: &str) -> Result<D> {
  Ok(serde_json::from_str(body)?)
}

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Accept only plain SQL identifiers as table names.
pub fn validate_table(name: &str) -> Result<()> {
  let mut chars = name.chars();
  let valid = chars
    .next()
    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
  if valid { Ok(()) } else { Err(Error::InvalidTable(name.to_owned())) }
}

// ─── Ordering ────────────────────────────────────────────────────────────────

/// The `ORDER BY` clause body for `order_by` against documents of type `D`.
pub fn order_clause<D: Document>(order_by: &OrderBy) -> Result<String> {
  let direction = match order_by.direction {
    SortOrder::Ascending => "ASC",
    SortOrder::Descending => "DESC",
  };

  if order_by.column == KEY_COLUMN {
    return Ok(format!("id {direction}"));
  }

  let field = D::FIELDS
    .iter()
    .find(|f| **f == order_by.column)
    .ok_or_else(|| Error::InvalidColumn(order_by.column.clone()))?;

  Ok(format!("json_extract(body, '$.{field}') {direction}, id ASC"))
}

/// SQLite treats a negative `LIMIT` as unlimited.
pub fn encode_limit(limit: u64) -> i64 {
  if limit == 0 { -1 } else { i64::try_from(limit).unwrap_or(i64::MAX) }
}
