//! Opening the three Firehose collections together.

use std::path::PathBuf;

use firehose_core::{
  actor::ActorSummary,
  collection::{Collection, Collections},
  event::ActivityRecord,
  subject::EnrichedSubject,
};

use crate::{Result, SqliteCollection};

/// The collections as opened by this backend.
pub type SqliteCollections = Collections<
  SqliteCollection<ActivityRecord>,
  SqliteCollection<EnrichedSubject>,
  SqliteCollection<ActorSummary>,
>;

/// Database file and table name for each collection.
#[derive(Debug, Clone)]
pub struct StoreConfig {
  pub events_db:         PathBuf,
  pub events_collection: String,
  pub repos_db:          PathBuf,
  pub repos_collection:  String,
  pub users_db:          PathBuf,
  pub users_collection:  String,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      events_db:         PathBuf::from("github.db"),
      events_collection: "events".to_owned(),
      repos_db:          PathBuf::from("github.db"),
      repos_collection:  "repos".to_owned(),
      users_db:          PathBuf::from("github.db"),
      users_collection:  "users".to_owned(),
    }
  }
}

/// Open (or create) every collection named in `config`.
pub async fn open_collections(config: &StoreConfig) -> Result<SqliteCollections> {
  tracing::info!(
    events = %config.events_db.display(),
    repos = %config.repos_db.display(),
    users = %config.users_db.display(),
    "opening collections"
  );
  Ok(Collections {
    events: Collection::new(
      &config.events_collection,
      SqliteCollection::open(&config.events_db, &config.events_collection).await?,
    ),
    repos:  Collection::new(
      &config.repos_collection,
      SqliteCollection::open(&config.repos_db, &config.repos_collection).await?,
    ),
    users:  Collection::new(
      &config.users_collection,
      SqliteCollection::open(&config.users_db, &config.users_collection).await?,
    ),
  })
}

/// All three collections, with their default names, on one in-memory
/// database — useful for testing.
pub async fn open_collections_in_memory() -> Result<SqliteCollections> {
  let names = StoreConfig::default();
  let conn = tokio_rusqlite::Connection::open_in_memory().await?;
  Ok(Collections {
    events: Collection::new(
      &names.events_collection,
      SqliteCollection::on_connection(conn.clone(), &names.events_collection).await?,
    ),
    repos:  Collection::new(
      &names.repos_collection,
      SqliteCollection::on_connection(conn.clone(), &names.repos_collection).await?,
    ),
    users:  Collection::new(
      &names.users_collection,
      SqliteCollection::on_connection(conn, &names.users_collection).await?,
    ),
  })
}
