//! SQL schema for a Firehose collection table.
//!
//! Executed once when a collection handle is opened; idempotent thanks to
//! `CREATE TABLE IF NOT EXISTS`.

/// DDL for one collection table.
///
/// `id` is declared without a type so it keeps the storage class it was
/// written with: TEXT keys for events and repos, INTEGER keys for users.
pub fn collection_ddl(table: &str) -> String {
  format!(
    "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS \"{table}\" (
    id    NOT NULL PRIMARY KEY,
    body  TEXT NOT NULL           -- JSON document
);
"
  )
}
