//! [`SqliteCollection`] — the SQLite implementation of [`CollectionStore`].

use std::{collections::HashMap, marker::PhantomData, path::Path, sync::Arc};

use firehose_core::store::{
  BulkWriteError, CollectionStore, Document, DocumentKey, OrderBy,
  WriteFailure,
};
use rusqlite::types::Value;

use crate::{
  Error, Result,
  encode::{
    decode_document, encode_document, encode_key, encode_limit, order_clause,
    validate_table,
  },
  schema::collection_ddl,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// One collection of `D` documents stored in a single SQLite table.
///
/// Cloning is cheap — the inner connection is reference-counted. Several
/// collections may share one connection (and so one database file).
pub struct SqliteCollection<D> {
  conn:  tokio_rusqlite::Connection,
  table: Arc<str>,
  _doc:  PhantomData<fn() -> D>,
}

impl<D> Clone for SqliteCollection<D> {
  fn clone(&self) -> Self {
    Self {
      conn:  self.conn.clone(),
      table: self.table.clone(),
      _doc:  PhantomData,
    }
  }
}

impl<D> std::fmt::Debug for SqliteCollection<D> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SqliteCollection")
      .field("table", &self.table)
      .finish_non_exhaustive()
  }
}

impl<D: Document> SqliteCollection<D> {
  /// Open (or create) the database at `path` and the `table` within it.
  pub async fn open(path: impl AsRef<Path>, table: &str) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::on_connection(conn, table).await
  }

  /// Open `table` in a fresh in-memory database — useful for testing.
  pub async fn open_in_memory(table: &str) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::on_connection(conn, table).await
  }

  /// Use `table` on an already-open connection.
  pub async fn on_connection(
    conn: tokio_rusqlite::Connection,
    table: &str,
  ) -> Result<Self> {
    validate_table(table)?;
    let store = Self { conn, table: Arc::from(table), _doc: PhantomData };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let ddl = collection_ddl(&self.table);
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&ddl)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── CollectionStore impl ────────────────────────────────────────────────────

impl<D: Document> CollectionStore for SqliteCollection<D> {
  type Document = D;
  type Error = Error;

  async fn insert_many(
    &self,
    docs: Vec<D>,
  ) -> Result<(), BulkWriteError<Error>> {
    let attempted = docs.len();
    let mut failures = Vec::new();
    let mut rows: Vec<(usize, Value, String)> = Vec::with_capacity(attempted);

    for (index, doc) in docs.iter().enumerate() {
      match encode_document(doc) {
        Ok(body) => rows.push((index, encode_key(doc.key()), body)),
        Err(error) => failures.push(WriteFailure { index: Some(index), error }),
      }
    }

    let sql = format!("INSERT INTO \"{}\" (id, body) VALUES (?1, ?2)", self.table);

    // Each INSERT is its own statement inside the transaction: a constraint
    // failure rolls back only that row.
    let rejected = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut rejected = Vec::new();
        {
          let mut stmt = tx.prepare(&sql)?;
          for (index, key, body) in rows {
            if let Err(e) = stmt.execute(rusqlite::params![key, body]) {
              rejected.push((index, e));
            }
          }
        }
        tx.commit()?;
        Ok(rejected)
      })
      .await
      .map_err(|e| BulkWriteError::whole(attempted, Error::Database(e)))?;

    failures.extend(rejected.into_iter().map(|(index, e)| WriteFailure {
      index: Some(index),
      error: Error::Sqlite(e),
    }));

    if failures.is_empty() {
      tracing::debug!(table = %self.table, count = attempted, "inserted documents");
      Ok(())
    } else {
      failures.sort_by_key(|f| f.index);
      Err(BulkWriteError { attempted, failures })
    }
  }

  async fn upsert_by_id(&self, docs: HashMap<DocumentKey, D>) -> Result<()> {
    let rows = docs
      .into_iter()
      .map(|(key, doc)| Ok((encode_key(key), encode_document(&doc)?)))
      .collect::<Result<Vec<_>>>()?;
    let count = rows.len();

    let sql = format!(
      "INSERT INTO \"{}\" (id, body) VALUES (?1, ?2)
       ON CONFLICT(id) DO UPDATE SET body = excluded.body",
      self.table
    );

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(&sql)?;
          for (key, body) in rows {
            stmt.execute(rusqlite::params![key, body])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(table = %self.table, count, "upserted documents");
    Ok(())
  }

  async fn count(&self) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM \"{}\"", self.table);
    let count: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
      .await?;
    Ok(count)
  }

  async fn find(&self, limit: u64, order_by: &OrderBy) -> Result<Vec<D>> {
    let sql = format!(
      "SELECT body FROM \"{}\" ORDER BY {} LIMIT ?1",
      self.table,
      order_clause::<D>(order_by)?
    );
    let limit = encode_limit(limit);

    let bodies: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    bodies.iter().map(|b| decode_document(b)).collect()
  }

  fn is_duplicate_key(error: &Error) -> bool { error.is_duplicate_key() }
}
